//! Password hashing and verification
//!
//! Argon2 with per-user random salts. Verification fails closed: a
//! stored hash that cannot be parsed rejects the login instead of
//! surfacing an error the caller could tell apart from a bad password.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use tracing::{error, warn};

use crate::error::{ServiceError, ServiceResult};

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ServiceError::Unavailable
        })?;

    Ok(hash.to_string())
}

/// Check a plaintext password against a stored hash.
///
/// Returns `false` for a wrong password and for a malformed stored
/// hash; the two cases are indistinguishable to the caller.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash failed to parse: {}", e);
            return false;
        }
    };

    let argon2 = Argon2::default();
    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let hash = hash_password("pw123").unwrap();
        assert!(verify_password("pw123", &hash));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let hash = hash_password("pw123").unwrap();
        assert!(!verify_password("pw124", &hash));
    }

    #[test]
    fn hashes_are_salted_per_user() {
        let first = hash_password("pw123").unwrap();
        let second = hash_password("pw123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_stored_hash_fails_closed() {
        assert!(!verify_password("pw123", "not-a-phc-string"));
        assert!(!verify_password("pw123", ""));
    }
}
