use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{RefreshRequest, SigninRequest, SignupRequest, SignupResponse, TokenPairResponse},
        MessageResponse,
    },
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// Register a new account
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = SignupResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "E-mail already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = state.auth_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(SignupResponse::created(user_id))))
}

/// Sign in with e-mail and password
#[utoipa::path(
    post,
    path = "/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenPairResponse),
        (status = 400, description = "Unknown e-mail, wrong password or invalid body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn signin(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SigninRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth_service.login(req).await?;
    Ok(Json(TokenPairResponse::new(pair, "Authentication successful")))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/refresh-token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenPairResponse),
        (status = 400, description = "Invalid, expired or revoked refresh token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth_service.refresh(&req.refresh_token).await?;
    Ok(Json(TokenPairResponse::new(pair, "Token refreshed successfully")))
}

/// Revoke the caller's refresh token
#[utoipa::path(
    post,
    path = "/revoke-token",
    responses(
        (status = 200, description = "Refresh token revoked", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
pub async fn revoke_token(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.revoke(&claims.user_id).await?;
    Ok(Json(MessageResponse::new("Refresh token revoked successfully")))
}
