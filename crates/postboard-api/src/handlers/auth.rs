//! Authentication API handlers
//!
//! Provides HTTP endpoints for signup, login and the caller's status.
//!
//! Author: hephaex@gmail.com

use crate::audit::ClientInfo;
use crate::auth::{AuthenticatedUser, LoginRequest, LoginResponse, SignupRequest};
use crate::error::AppError;
use crate::feed::StatusRequest;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Current status of the caller
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "I am new!")]
    pub status: String,
}

/// Status after an update
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusUpdatedResponse {
    pub message: String,
    pub status: String,
}

/// Register a new user account
///
/// # Request Body
///
/// * `email` - Valid email address (unique)
/// * `password` - At least 5 characters after trimming
/// * `name` - Display name, must not be blank
///
/// # Responses
///
/// * `201 Created` - User created
/// * `409 Conflict` - Email already registered
/// * `422 Unprocessable Entity` - Invalid input
#[utoipa::path(
    put,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = crate::auth::SignupResponse),
        (status = 409, description = "Email already exists", body = crate::error::ApiError),
        (status = 422, description = "Invalid input", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client = ClientInfo::from_headers(&headers);
    let response = state.auth.signup(request, &client).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
///
/// Returns a token valid for one hour. An unknown email and a wrong
/// password produce the same response.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let client = ClientInfo::from_headers(&headers);
    let response = state.auth.login(request, &client).await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/auth/status",
    tag = "auth",
    responses(
        (status = 200, description = "Current status", body = StatusResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<StatusResponse>, AppError> {
    let status = state.feed.status(user.user_id).await?;
    Ok(Json(StatusResponse { status }))
}

#[utoipa::path(
    patch,
    path = "/auth/status",
    tag = "auth",
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Status updated", body = StatusUpdatedResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 422, description = "Empty status", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<StatusUpdatedResponse>, AppError> {
    let status = state.feed.set_status(user.user_id, request).await?;

    Ok(Json(StatusUpdatedResponse {
        message: "User status updated.".to_string(),
        status,
    }))
}
