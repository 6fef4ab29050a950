//! JWT session tokens
//!
//! Tokens are signed with HS256 using one process-wide secret. Expiry
//! is checked here against a caller-supplied clock instead of by the
//! JWT library, so a bad signature and an expired token stay two
//! distinct outcomes and time is injectable in tests.

use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Role, User};

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Token lifetime in seconds
    pub token_ttl: u64,
    /// Tolerated clock skew in seconds when checking expiry
    pub leeway: i64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Shared signing secret (required)
    /// - `JWT_TTL_SECONDS`: Token lifetime in seconds (default: 86400)
    /// - `JWT_LEEWAY_SECONDS`: Tolerated clock skew in seconds (default: 0)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let token_ttl = std::env::var("JWT_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);

        let leeway = std::env::var("JWT_LEEWAY_SECONDS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .unwrap_or(0);

        Ok(JwtConfig {
            secret,
            token_ttl,
            leeway,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Role the user held when the token was issued
    pub role: Role,
    /// Issued at time (seconds since epoch)
    pub iat: i64,
    /// Expiration time (seconds since epoch)
    pub exp: i64,
}

/// Why a token failed validation.
///
/// `Expired` is only reported for tokens whose signature checked out;
/// a forged token never learns whether its expiry would have passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature invalid")]
    InvalidSignature,
    #[error("token malformed")]
    Malformed,
}

/// Token issuing and validation service
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl TokenService {
    /// Initialize a new token service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        // Signature and shape only; expiry is checked in validate()
        // against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        TokenService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Issue a token for a user, valid from `now` for the configured
    /// lifetime.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> ServiceResult<String> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat,
            exp: iat + self.config.token_ttl as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!("Token signing failed: {}", e);
            ServiceError::Unavailable
        })
    }

    /// Validate a token at time `now` and return its claims.
    ///
    /// The signature is checked first; only a genuine token can be
    /// reported as expired. A token is valid while
    /// `now < exp + leeway`.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                    _ => TokenError::Malformed,
                }
            })?;

        let claims = token_data.claims;
        if now.timestamp() >= claims.exp + self.config.leeway {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Configured token lifetime in seconds
    pub fn token_ttl(&self) -> u64 {
        self.config.token_ttl
    }
}
