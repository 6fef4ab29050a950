//! Attendance service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Registration;
use crate::error::ServiceError;
use crate::jwt::Claims;
use crate::middleware::auth_middleware;
use crate::models::{NewClass, User};
use crate::policy::{ClassAction, Decision};
use crate::state::AppState;

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for a successful login
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

/// Request for marking or correcting attendance
#[derive(Deserialize)]
pub struct AttendanceRequest {
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: String,
}

/// Request for an authorization probe on a class
#[derive(Deserialize)]
pub struct AuthorizeRequest {
    pub action: ClassAction,
}

/// Response for an authorization probe
#[derive(Serialize)]
pub struct AuthorizeResponse {
    pub decision: Decision,
}

/// Request for validating a scanned check-in code
#[derive(Deserialize)]
pub struct ValidateCodeRequest {
    pub code: String,
}

/// Create the router for the attendance service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/classes", get(list_classes))
        .route("/api/classes", post(create_class))
        .route("/api/classes/:id", get(get_class))
        .route("/api/classes/:id/authorize", post(authorize_class_action))
        .route("/api/classes/teacher/:teacher_id", get(list_teacher_classes))
        .route("/api/attendance", post(mark_attendance))
        .route("/api/attendance", put(correct_attendance))
        .route("/api/attendance/class/:class_id", get(class_roster))
        .route("/api/attendance/student/:student_id", get(student_history))
        .route("/api/checkin/class/:class_id", post(mint_checkin_code))
        .route("/api/checkin/validate", post(validate_checkin_code))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "attendance-service"
    }))
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Registration>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and receive a session token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let session = state
        .auth
        .login(&payload.username, &payload.password, Utc::now())
        .await?;

    Ok(Json(TokenResponse {
        token: session.token,
        token_type: "Bearer".to_string(),
        expires_in: session.expires_in,
        user: session.user,
    }))
}

/// The caller's timetable
pub async fn list_classes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ServiceError> {
    let classes = state.classes.list_for(&claims).await?;
    Ok(Json(classes))
}

/// Create a class
pub async fn create_class(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NewClass>,
) -> Result<impl IntoResponse, ServiceError> {
    let class = state.classes.create(&claims, payload).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

/// Fetch one class
pub async fn get_class(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let class = state.classes.get(&claims, id).await?;
    Ok(Json(class))
}

/// Classes owned by one teacher
pub async fn list_teacher_classes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(teacher_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let classes = state.classes.list_by_teacher(&claims, teacher_id).await?;
    Ok(Json(classes))
}

/// Ask whether the caller may perform an action on a class
pub async fn authorize_class_action(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AuthorizeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let decision = state
        .classes
        .authorize_class_action(&claims, id, payload.action)
        .await?;
    Ok(Json(AuthorizeResponse { decision }))
}

/// Mark attendance
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AttendanceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .attendance
        .mark(
            &claims,
            payload.class_id,
            payload.student_id,
            payload.date,
            &payload.status,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Correct an existing attendance record
pub async fn correct_attendance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AttendanceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .attendance
        .correct(
            &claims,
            payload.class_id,
            payload.student_id,
            payload.date,
            &payload.status,
        )
        .await?;
    Ok(Json(record))
}

/// Attendance roster of a class
pub async fn class_roster(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(class_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state.attendance.class_roster(&claims, class_id).await?;
    Ok(Json(records))
}

/// Attendance history of a student
pub async fn student_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state
        .attendance
        .student_history(&claims, student_id)
        .await?;
    Ok(Json(records))
}

/// Mint a check-in code for a class
pub async fn mint_checkin_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(class_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let code = state.checkin.mint(&claims, class_id, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(code)))
}

/// Validate a scanned check-in code
pub async fn validate_checkin_code(
    State(state): State<AppState>,
    Json(payload): Json<ValidateCodeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let class_id = state.checkin.validate(&payload.code, Utc::now())?;
    Ok(Json(serde_json::json!({ "class_id": class_id })))
}
