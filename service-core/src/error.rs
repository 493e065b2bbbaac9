use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Caller-facing failure taxonomy shared by the platform services.
///
/// Every variant maps to a stable HTTP status, a machine-checkable `code`,
/// and a generic message. Wrapped causes are logged at response time and
/// never serialized into a response body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Already exists: {0}")]
    AlreadyExists(anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Challenge rejected")]
    OtpRejected,

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::StoreUnavailable(anyhow::Error::new(err))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(err: lettre::error::Error) -> Self {
        AppError::DeliveryFailed(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            code: &'static str,
        }

        let (status, code, error_message) = match &self {
            AppError::ValidationError(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                err.to_string(),
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, "bad_request", err.to_string()),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
            AppError::AlreadyExists(err) => {
                (StatusCode::BAD_REQUEST, "already_exists", err.to_string())
            }
            AppError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                "invalid_credentials",
                "Invalid credentials".to_string(),
            ),
            AppError::OtpRejected => (
                StatusCode::BAD_REQUEST,
                "otp_rejected",
                "Invalid or expired OTP".to_string(),
            ),
            AppError::Unauthorized(err) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
            }
            AppError::Forbidden(err) => (StatusCode::FORBIDDEN, "forbidden", err.to_string()),
            AppError::DeliveryFailed(msg) => {
                tracing::error!(error = %msg, "Notification delivery failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "delivery_failed",
                    "Failed to deliver notification".to_string(),
                )
            }
            AppError::StoreUnavailable(err) => {
                tracing::error!(error = %err, "Store unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_unavailable",
                    "Storage backend unavailable".to_string(),
                )
            }
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                code,
            }),
        )
            .into_response()
    }
}
