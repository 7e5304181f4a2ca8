//! API error types with automatic HTTP status mapping.
//!
//! Backend failures are logged and returned as generic 500 JSON bodies;
//! absence and caller mistakes keep their messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use mixbench_core::{CacheError, ReadError, StoreError};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Requested record does not exist (404)
    #[error("not found")]
    NotFound,

    /// Malformed caller input (400)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Store rejected the operation or supplied no connection (500)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Cache rejected the operation or supplied no connection (500)
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Cache-aside read failed on either leg (500)
    #[error(transparent)]
    Read(#[from] ReadError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store unavailable".to_string(),
                )
            }
            Self::Cache(err) => {
                tracing::error!(error = %err, "cache operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "cache unavailable".to_string(),
                )
            }
            Self::Read(err) => {
                tracing::error!(error = %err, "cache-aside read failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "read failed".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use mixbench_core::PoolError;

    use super::*;

    #[tokio::test]
    async fn not_found_is_404() {
        let response = ApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_request_is_400() {
        let response = ApiError::BadRequest("bad id".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn backend_failures_are_500() {
        let store: ApiError = StoreError::Pool(PoolError::Closed).into();
        assert_eq!(
            store.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let cache: ApiError = CacheError::Pool(PoolError::Closed).into();
        assert_eq!(
            cache.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn error_body_is_json() {
        let response = ApiError::NotFound.into_response();
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("body");
        let parsed: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(parsed["error"], "not found");
    }
}
