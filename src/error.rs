use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String, Vec<ErrorDetail>),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Validation failure for a single named field.
    pub fn field(field: &str, message: &str) -> Self {
        AppError::Validation(
            format!("{field} validation failed"),
            vec![ErrorDetail {
                message: message.to_string(),
                field: Some(field.to_string()),
            }],
        )
    }
}

/// One entry of the `errors` array in an error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Error response body: `{message, errors}`.
#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub errors: Vec<ErrorDetail>,
}

/// Body returned by delete endpoints: `{message, code}`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub code: &'static str,
}

impl MessageResponse {
    pub fn deleted(entity: &str) -> Self {
        Self {
            message: format!("SUCCESS: {entity} deleted"),
            code: "SUCCESS",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    Vec::new(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, Vec::new()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, Vec::new()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, Vec::new()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, Vec::new()),
            AppError::Validation(msg, details) => (StatusCode::UNPROCESSABLE_ENTITY, msg, details),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, Vec::new()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg, Vec::new())
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg, Vec::new())
            }
            AppError::Jwt(e) => {
                tracing::warn!("JWT error: {:?}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    "Invalid token".to_string(),
                    Vec::new(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IO error".to_string(),
                    Vec::new(),
                )
            }
        };

        let errors = if details.is_empty() {
            vec![ErrorDetail {
                message: message.clone(),
                field: None,
            }]
        } else {
            details
        };

        let body = Json(ErrorBody { message, errors });
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
