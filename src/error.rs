//! Error taxonomy for the service layer and its HTTP mapping.
//!
//! Error bodies follow one schema:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "vehicle not found: 42" } }
//! ```
//!
//! Store failures are logged in full but answered with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use motorlot_core::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// One or more search parameters were rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A single-entity lookup found nothing.
    #[error("{0} not found")]
    NotFound(String),

    /// The underlying store failed or timed out.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_failed",
            AppError::NotFound(_) => "not_found",
            AppError::Store(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, messages) = match &self {
            AppError::Validation(e) => (e.to_string(), e.messages.clone()),
            AppError::NotFound(_) => (self.to_string(), Vec::new()),
            AppError::Store(e) => {
                tracing::error!("request failed: {:#}", e);
                ("internal server error".to_string(), Vec::new())
            }
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message,
                messages,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let v = AppError::from(ValidationError {
            messages: vec!["bad".to_string()],
        });
        assert_eq!(v.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::NotFound("vehicle 9".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(anyhow::anyhow!("disk on fire")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            AppError::NotFound("vehicle 9".to_string()).to_string(),
            "vehicle 9 not found"
        );
    }
}
