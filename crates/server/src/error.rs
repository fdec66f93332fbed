// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use forum_harvest_core::ForumId;
use serde::Serialize;
use thiserror::Error;

use crate::controller::ControllerError;
use crate::export::ExportError;

/// JSON body for both success and error replies: `{"status", "message"}`.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid forum: {0}")]
    InvalidForum(String),

    #[error("Scraping is already in progress")]
    AlreadyRunning,

    #[error("No scraping in progress")]
    NotRunning,

    #[error("Database error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ControllerError> for ApiError {
    fn from(e: ControllerError) -> Self {
        match e {
            ControllerError::InvalidForum(name) => ApiError::InvalidForum(name),
            ControllerError::AlreadyRunning => ApiError::AlreadyRunning,
            ControllerError::NotRunning => ApiError::NotRunning,
            ControllerError::Store(e) => ApiError::Store(e.to_string()),
            e @ ControllerError::NoJob(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Store(e) => ApiError::Store(e.to_string()),
            e @ ExportError::Write { .. } => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::InvalidForum(name) => {
                tracing::warn!(forum = %name, "Rejected start for unknown forum");
                (
                    StatusCode::BAD_REQUEST,
                    StatusResponse::error(format!(
                        "Invalid forum. Choose {}",
                        ForumId::valid_names()
                    )),
                )
            }
            ApiError::AlreadyRunning => {
                tracing::warn!("Rejected start while a job is running");
                (
                    StatusCode::BAD_REQUEST,
                    StatusResponse::error("Scraping is already in progress"),
                )
            }
            ApiError::NotRunning => {
                tracing::warn!("Rejected stop with no job running");
                (
                    StatusCode::BAD_REQUEST,
                    StatusResponse::error("No scraping in progress"),
                )
            }
            ApiError::Store(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    StatusResponse::error("Database error"),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    StatusResponse::error("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use forum_harvest_core::StoreError;

    /// Helper to extract status code and body from a response
    async fn extract_response(response: Response) -> (StatusCode, StatusResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: StatusResponse = serde_json::from_slice(&body).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_invalid_forum_returns_400() {
        let (status, body) =
            extract_response(ApiError::InvalidForum("reddit".into()).into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.status, "error");
        assert_eq!(body.message, "Invalid forum. Choose 'dread' or 'cryptbb'");
    }

    #[tokio::test]
    async fn test_already_running_returns_400() {
        let (status, body) = extract_response(ApiError::AlreadyRunning.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Scraping is already in progress");
    }

    #[tokio::test]
    async fn test_not_running_returns_400() {
        let (status, body) = extract_response(ApiError::NotRunning.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "No scraping in progress");
    }

    #[tokio::test]
    async fn test_store_error_hides_details() {
        let (status, body) =
            extract_response(ApiError::Store("disk I/O error".into()).into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Database error");
    }

    #[tokio::test]
    async fn test_internal_error_returns_500() {
        let (status, body) =
            extract_response(ApiError::Internal("oops".into()).into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn test_from_controller_error() {
        assert!(matches!(
            ApiError::from(ControllerError::InvalidForum("x".into())),
            ApiError::InvalidForum(ref f) if f == "x"
        ));
        assert!(matches!(
            ApiError::from(ControllerError::AlreadyRunning),
            ApiError::AlreadyRunning
        ));
        assert!(matches!(
            ApiError::from(ControllerError::NotRunning),
            ApiError::NotRunning
        ));
        assert!(matches!(
            ApiError::from(ControllerError::NoJob(ForumId::Dread)),
            ApiError::Internal(_)
        ));
        let store = StoreError::backend(std::io::Error::new(std::io::ErrorKind::Other, "locked"));
        assert!(matches!(
            ApiError::from(ControllerError::Store(store)),
            ApiError::Store(_)
        ));
    }

    #[test]
    fn test_status_response_serialization() {
        let json = serde_json::to_string(&StatusResponse::success("Scraping dread started")).unwrap();
        assert_eq!(
            json,
            r#"{"status":"success","message":"Scraping dread started"}"#
        );
    }
}
