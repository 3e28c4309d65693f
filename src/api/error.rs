use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use std::sync::OnceLock;

use super::ApiResponse;

/// Set once at startup; when enabled, internal error detail is included in
/// 500 responses instead of a generic message.
static DEVELOPMENT_MODE: OnceLock<bool> = OnceLock::new();

pub fn set_development_mode(enabled: bool) {
    DEVELOPMENT_MODE.set(enabled).ok();
}

fn development_mode() -> bool {
    DEVELOPMENT_MODE.get().copied().unwrap_or(false)
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    Conflict(String),

    DatabaseError(String),

    ExternalApiError { service: String, message: String },

    InternalError(String),

    Unauthorized(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ExternalApiError { service, message } => {
                write!(f, "{} error: {}", service, message)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Duplicate registrations and the like surface as a plain 400,
            // matching the rest of the client-facing contract.
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ExternalApiError { service, message } => {
                tracing::warn!("{} error: {}", service, message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{} request failed", service),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                let body = if development_mode() {
                    msg.clone()
                } else {
                    "An internal error occurred".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<crate::services::MediaError> for ApiError {
    fn from(err: crate::services::MediaError) -> Self {
        ApiError::ExternalApiError {
            service: "Media storage".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<crate::services::AnalysisError> for ApiError {
    fn from(err: crate::services::AnalysisError) -> Self {
        ApiError::ExternalApiError {
            service: "Image analysis".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<crate::services::AuthFlowError> for ApiError {
    fn from(err: crate::services::AuthFlowError) -> Self {
        use crate::services::AuthFlowError;

        match &err {
            AuthFlowError::Duplicate => ApiError::Conflict(err.to_string()),
            AuthFlowError::NotFound => ApiError::NotFound(err.to_string()),
            AuthFlowError::InvalidCode => ApiError::ValidationError(err.to_string()),
            AuthFlowError::InvalidSession => ApiError::Unauthorized(err.to_string()),
            AuthFlowError::Delivery(source) => ApiError::ExternalApiError {
                service: "Email".to_string(),
                message: source.to_string(),
            },
            AuthFlowError::Database(msg) => ApiError::DatabaseError(msg.clone()),
        }
    }
}

impl ApiError {
    pub fn report_not_found(id: i32) -> Self {
        ApiError::NotFound(format!("Report {} not found", id))
    }

    pub fn comment_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Comment {} not found", id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
