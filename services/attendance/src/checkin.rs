//! Check-in codes
//!
//! A check-in code is a short-lived signed token naming one class,
//! shown in the classroom (typically rendered as a QR image by the
//! client) and scanned by students. Codes are minted by the class
//! owner or an admin and carry a nonce, so every refresh produces a
//! distinct code. Rendering and scanning are client concerns; this
//! service only signs and verifies.

use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::jwt::Claims;
use crate::policy::{self, Action};
use crate::store::ClassStore;

/// Check-in configuration
#[derive(Debug, Clone)]
pub struct CheckInConfig {
    /// Seconds a minted code stays valid
    pub validity_seconds: u64,
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            // Codes refresh every few seconds on screen; anything
            // older than this is a replayed photo, not a live scan.
            validity_seconds: 8,
        }
    }
}

impl CheckInConfig {
    /// Create a new CheckInConfig from environment variables
    ///
    /// # Environment Variables
    /// - `CHECKIN_VALIDITY_SECONDS`: Code lifetime in seconds (default: 8)
    pub fn from_env() -> Result<Self> {
        let validity_seconds = std::env::var("CHECKIN_VALIDITY_SECONDS")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .unwrap_or(8);

        Ok(Self { validity_seconds })
    }
}

/// Claims carried inside a check-in code
#[derive(Debug, Serialize, Deserialize)]
struct CheckInClaims {
    class_id: Uuid,
    nonce: String,
    iat: i64,
    exp: i64,
}

/// A freshly minted check-in code
#[derive(Debug, Clone, Serialize)]
pub struct CheckInCode {
    pub code: String,
    pub class_id: Uuid,
    /// Seconds since epoch after which the code is stale
    pub expires_at: i64,
}

/// Check-in code service
#[derive(Clone)]
pub struct CheckInService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: CheckInConfig,
    classes: Arc<dyn ClassStore>,
}

impl CheckInService {
    /// Create a new check-in service. Codes are signed with the same
    /// process-wide secret as session tokens.
    pub fn new(secret: &str, config: CheckInConfig, classes: Arc<dyn ClassStore>) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
            classes,
        }
    }

    /// Mint a code for a class. Only the owning teacher or an admin
    /// may do so.
    pub async fn mint(
        &self,
        claims: &Claims,
        class_id: Uuid,
        now: DateTime<Utc>,
    ) -> ServiceResult<CheckInCode> {
        let class = self
            .classes
            .get(class_id)
            .await
            .map_err(|e| {
                error!("Class lookup failed: {}", e);
                ServiceError::Unavailable
            })?
            .ok_or(ServiceError::ClassNotFound)?;

        policy::ensure(
            claims,
            &Action::MintCheckIn {
                class_owner: class.teacher_id,
            },
        )?;

        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();

        let iat = now.timestamp();
        let exp = iat + self.config.validity_seconds as i64;
        let code = encode(
            &Header::new(Algorithm::HS256),
            &CheckInClaims {
                class_id,
                nonce,
                iat,
                exp,
            },
            &self.encoding_key,
        )
        .map_err(|e| {
            error!("Check-in code signing failed: {}", e);
            ServiceError::Unavailable
        })?;

        Ok(CheckInCode {
            code,
            class_id,
            expires_at: exp,
        })
    }

    /// Verify a scanned code at time `now` and return the class it
    /// names. Stale, forged and malformed codes are all rejected the
    /// same way.
    pub fn validate(&self, code: &str, now: DateTime<Utc>) -> ServiceResult<Uuid> {
        let token_data = decode::<CheckInClaims>(code, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Check-in code rejected: {}", e);
                ServiceError::Unauthorized
            })?;

        if now.timestamp() >= token_data.claims.exp {
            return Err(ServiceError::Unauthorized);
        }

        Ok(token_data.claims.class_id)
    }
}
