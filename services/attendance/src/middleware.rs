//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::error::ServiceError;
use crate::state::AppState;

/// Extract and validate the bearer token from the Authorization
/// header, then hand the verified claims to the handler through
/// request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ServiceError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ServiceError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ServiceError::Unauthorized)?;

    let claims = state.auth.validate_request(token, Utc::now())?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
