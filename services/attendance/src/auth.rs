//! Authentication service
//!
//! Registration, login and request validation. Login failures are
//! deliberately uniform: an unknown username, a wrong password and a
//! corrupt stored hash all come back as the same [`ServiceError::AuthFailed`],
//! and the unknown-username path still runs a password verification so
//! the two cases take comparable time.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::jwt::{Claims, TokenService};
use crate::models::{NewUser, Role, User};
use crate::password::{hash_password, verify_password};
use crate::store::{StoreError, UserStore};
use crate::throttle::LoginThrottle;
use crate::validation::{validate_email, validate_full_name, validate_password, validate_username};

/// Registration payload. No Debug derive: the plaintext password must
/// never reach a log line.
#[derive(Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

/// A successful login: the signed token plus its subject
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    throttle: LoginThrottle,
    /// Verified against when the username is unknown, so both failure
    /// paths cost one argon2 run.
    dummy_hash: String,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: TokenService,
        throttle: LoginThrottle,
    ) -> ServiceResult<Self> {
        let dummy_hash = hash_password("placeholder-for-unknown-users")?;
        Ok(Self {
            users,
            tokens,
            throttle,
            dummy_hash,
        })
    }

    /// Register a new account
    pub async fn register(&self, registration: Registration) -> ServiceResult<User> {
        validate_username(&registration.username).map_err(ServiceError::InvalidInput)?;
        validate_password(&registration.password).map_err(ServiceError::InvalidInput)?;
        validate_full_name(&registration.full_name).map_err(ServiceError::InvalidInput)?;
        validate_email(&registration.email).map_err(ServiceError::InvalidInput)?;

        let existing = self
            .users
            .get_by_username(&registration.username)
            .await
            .map_err(|e| {
                error!("User lookup failed: {}", e);
                ServiceError::Unavailable
            })?;
        if existing.is_some() {
            return Err(ServiceError::UsernameTaken);
        }

        let password_hash = hash_password(&registration.password)?;
        let user = self
            .users
            .insert(NewUser {
                username: registration.username,
                full_name: registration.full_name,
                email: registration.email,
                password_hash,
                role: registration.role,
            })
            .await
            .map_err(|e| match e {
                // Lost a race against another registration for the
                // same username.
                StoreError::Conflict => ServiceError::UsernameTaken,
                StoreError::Unavailable(detail) => {
                    error!("User insert failed: {}", detail);
                    ServiceError::Unavailable
                }
            })?;

        info!("Registered {} account {}", user.role, user.username);
        Ok(user)
    }

    /// Authenticate a user and issue a session token
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<LoginSession> {
        if !self.throttle.check(username).await {
            warn!("Throttled login attempt for {}", username);
            return Err(ServiceError::RateLimited);
        }

        let user = self.users.get_by_username(username).await.map_err(|e| {
            error!("User lookup failed: {}", e);
            ServiceError::Unavailable
        })?;

        match user {
            Some(user) if verify_password(password, &user.password_hash) => {
                self.throttle.clear(username).await;
                let token = self.tokens.issue(&user, now)?;
                info!("User {} logged in", user.username);
                Ok(LoginSession {
                    token,
                    expires_in: self.tokens.token_ttl(),
                    user,
                })
            }
            Some(_) => {
                self.throttle.record_failure(username).await;
                Err(ServiceError::AuthFailed)
            }
            None => {
                // Keep the unknown-username path as slow as the
                // wrong-password path.
                let _ = verify_password(password, &self.dummy_hash);
                self.throttle.record_failure(username).await;
                Err(ServiceError::AuthFailed)
            }
        }
    }

    /// Validate a bearer token and return its claims
    pub fn validate_request(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<Claims> {
        self.tokens.validate(token, now).map_err(|e| {
            debug!("Token rejected: {}", e);
            ServiceError::Unauthorized
        })
    }
}
