//! Error types for grievance-rs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// Every API failure maps to exactly one variant, and every variant carries a
/// stable error code rendered by the client.
#[derive(Debug, Error)]
pub enum AppError {
    // === Domain Errors ===
    #[error("Cannot move grievance from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Missing or invalid authentication token")]
    Unauthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not eligible: {0}")]
    NotEligible(String),

    #[error("OTP has expired or was never issued")]
    OtpExpired,

    #[error("OTP does not match")]
    OtpMismatch,

    #[error("Too many OTP attempts")]
    OtpAttemptsExceeded,

    #[error("Could not generate a unique reference id")]
    IdGenerationExhausted,

    #[error("Grievance was modified concurrently")]
    ConcurrentModification,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    // === Dependency Errors ===
    #[error("Dependency timed out: {0}")]
    DependencyTimeout(String),

    #[error("Notification delivery failed: {0}")]
    NotificationDeliveryFailed(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::InvalidTransition { .. } | Self::ConcurrentModification | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotEligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OtpExpired | Self::OtpMismatch | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::OtpAttemptsExceeded | Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            // 5xx Dependency and Server Errors
            Self::DependencyTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::NotificationDeliveryFailed(_) => StatusCode::BAD_GATEWAY,
            Self::IdGenerationExhausted => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::NotEligible(_) => "NOT_ELIGIBLE",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpMismatch => "OTP_MISMATCH",
            Self::OtpAttemptsExceeded => "OTP_ATTEMPTS_EXCEEDED",
            Self::IdGenerationExhausted => "ID_GENERATION_EXHAUSTED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::DependencyTimeout(_) => "DEPENDENCY_TIMEOUT",
            Self::NotificationDeliveryFailed(_) => "NOTIFICATION_DELIVERY_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether a downstream collaborator, not the request, caused this error.
    #[must_use]
    pub const fn is_dependency_error(&self) -> bool {
        matches!(
            self,
            Self::DependencyTimeout(_) | Self::NotificationDeliveryFailed(_)
        )
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_client_errors() {
        let errors = [
            AppError::InvalidTransition {
                from: "Submitted".to_string(),
                to: "Resolved".to_string(),
            },
            AppError::Unauthorized("department mismatch".to_string()),
            AppError::Unauthenticated,
            AppError::NotEligible("cooldown".to_string()),
            AppError::OtpAttemptsExceeded,
            AppError::ConcurrentModification,
        ];

        for err in errors {
            assert!(err.status_code().is_client_error(), "{err}");
            assert!(!err.is_dependency_error());
        }
    }

    #[test]
    fn test_dependency_errors_are_distinct() {
        let timeout = AppError::DependencyTimeout("notification sender".to_string());
        let delivery = AppError::NotificationDeliveryFailed("gateway 500".to_string());

        assert!(timeout.is_dependency_error());
        assert!(delivery.is_dependency_error());
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(delivery.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Unauthorized(String::new()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(AppError::Unauthenticated.error_code(), "UNAUTHENTICATED");
        assert_eq!(
            AppError::IdGenerationExhausted.error_code(),
            "ID_GENERATION_EXHAUSTED"
        );
        assert_eq!(AppError::OtpMismatch.error_code(), "OTP_MISMATCH");
    }
}
