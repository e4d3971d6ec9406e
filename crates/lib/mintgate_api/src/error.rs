//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized ({kind}): {message}")]
    Unauthorized { kind: &'static str, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Database unavailable: {0}")]
    DbUnavailable(String),

    #[error("Asset ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Deployment failed: {0}")]
    DeploymentFailed(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Unauthorized { kind, message } => {
                (StatusCode::UNAUTHORIZED, *kind, message.as_str())
            }
            AppError::RateLimited(m) => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limited", m.as_str())
            }
            AppError::DbUnavailable(m) => {
                (StatusCode::SERVICE_UNAVAILABLE, "db_unavailable", m.as_str())
            }
            AppError::LedgerUnavailable(m) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ledger_unavailable",
                m.as_str(),
            ),
            AppError::DeploymentFailed(m) => {
                (StatusCode::BAD_GATEWAY, "deployment_failed", m.as_str())
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            ),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<mintgate_core::auth::AuthError> for AppError {
    fn from(e: mintgate_core::auth::AuthError) -> Self {
        use mintgate_core::auth::AuthError;
        let kind = match &e {
            AuthError::Expired { .. } => "request_expired",
            AuthError::FutureTimestamp { .. } => "invalid_timestamp",
            AuthError::Replayed => "replay_detected",
            AuthError::InvalidSignature { .. } => "invalid_signature",
            AuthError::NonceStore(inner) => return AppError::DbUnavailable(inner.to_string()),
        };
        AppError::Unauthorized {
            kind,
            message: e.to_string(),
        }
    }
}

impl From<mintgate_core::eligibility::EligibilityError> for AppError {
    fn from(e: mintgate_core::eligibility::EligibilityError) -> Self {
        use mintgate_core::eligibility::EligibilityError;
        match &e {
            EligibilityError::Ledger(inner) => AppError::LedgerUnavailable(inner.to_string()),
            EligibilityError::UnsupportedDecimals { .. } => AppError::Internal(e.to_string()),
        }
    }
}

impl From<mintgate_core::deploy::DeployError> for AppError {
    fn from(e: mintgate_core::deploy::DeployError) -> Self {
        use mintgate_core::deploy::DeployError;
        match e {
            DeployError::Auth(inner) => AppError::from(inner),
            DeployError::Eligibility(inner) => AppError::from(inner),
            DeployError::MessageMismatch(inner) => AppError::Validation(inner.to_string()),
            DeployError::DeploymentFailed(inner) => AppError::DeploymentFailed(inner.to_string()),
            DeployError::InsufficientBalance { .. } => AppError::Unauthorized {
                kind: "insufficient_balance",
                message: e.to_string(),
            },
        }
    }
}
