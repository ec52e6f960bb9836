pub mod generate_pdf;
pub mod health;
pub mod subscription;

use crate::error::ApiError;
use axum::http::StatusCode;

/// `OPTIONS` answer for routers mounted without the CORS layer
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
