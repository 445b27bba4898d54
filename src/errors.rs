use crate::{models::names::NameError, services::storage_gateway::StorageError};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// Failed file operations: missing files are 404, anything else is 400.
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let detail = err.detail();
        if detail.is_not_found {
            AppError::not_found(detail.message)
        } else {
            AppError::bad_request(detail.message)
        }
    }
}

impl From<NameError> for AppError {
    fn from(err: NameError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::new(err.status(), err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage_gateway::Operation;

    #[test]
    fn not_found_storage_error_maps_to_404() {
        let err = AppError::from(StorageError::NotFound {
            key: "a.pdf".into(),
        });
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.message.contains("a.pdf"));
    }

    #[test]
    fn other_storage_errors_map_to_400() {
        let protocol = AppError::from(StorageError::Protocol {
            operation: Operation::Upload,
            message: "SlowDown: reduce your request rate".into(),
        });
        assert_eq!(protocol.status, StatusCode::BAD_REQUEST);
        assert!(protocol.message.contains("SlowDown"));

        let unexpected = AppError::from(StorageError::Unexpected(Operation::Download));
        assert_eq!(unexpected.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn response_body_carries_message_and_status() {
        let response = AppError::internal("bucket unavailable").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "bucket unavailable");
        assert_eq!(body["status"], 500);
    }
}
