use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// A single offending input field with its client-facing message.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("identifier already registered")]
    Conflict,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("otp invalid or expired")]
    OtpInvalidOrExpired,
    #[error("database error")]
    Store(#[from] sqlx::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AuthError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, "Validation failed.", Some(errors))
            }
            AuthError::Conflict => (
                StatusCode::CONFLICT,
                "Email or phone number already exists.",
                None,
            ),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials.", None)
            }
            AuthError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired token.", None)
            }
            AuthError::OtpInvalidOrExpired => {
                (StatusCode::BAD_REQUEST, "Invalid or expired OTP.", None)
            }
            AuthError::Store(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error. Please try again.",
                    None,
                )
            }
            AuthError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error. Please try again.",
                    None,
                )
            }
        };
        (status, Json(ErrorBody { message, errors })).into_response()
    }
}
