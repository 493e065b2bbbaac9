use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{LoginRequest, RegisterRequest, SendOtpRequest, VerifyOtpRequest},
    utils::ValidatedJson,
    AppState,
};

/// Register a new user. Registration does not log the user in.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.login(req).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Issue an OTP challenge and deliver it out-of-band
pub async fn send_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SendOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.send_otp(req).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Verify an OTP challenge and register the identity it gates
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.verify_otp(req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}
