use crate::service::ServiceError;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error returned by route handlers, rendered as a JSON body
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed,
    /// The data store could not be reached; the detail is only logged
    StoreUnavailable(String),
    /// Rendering failed; the detail is sent back to the caller
    RenderFailed(String),
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_string(),
                None,
            ),
            ApiError::StoreUnavailable(detail) => {
                tracing::warn!("store unavailable: {detail}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Database connection failed".to_string(),
                    None,
                )
            }
            ApiError::RenderFailed(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate PDF".to_string(),
                Some(detail),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error,
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(detail) => ApiError::StoreUnavailable(detail),
            StoreError::Corrupt(detail) => ApiError::Internal(format!("corrupt store: {detail}")),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound => ApiError::NotFound("Marksheet not found".to_string()),
            ServiceError::Store(e) => e.into(),
            ServiceError::Render(detail) => ApiError::RenderFailed(detail),
        }
    }
}
