//! HTTP service for marksheet PDFs
//!
//! Routes:
//! - `GET /api/generate-pdf?marksheetId=<id>` downloads the PDF
//! - `POST /api/generate-pdf` returns it as base64 JSON
//! - `POST /api/subscription-check` reports push subscription status
//! - `GET /health`

pub mod cache;
pub mod config;
pub mod error;
pub mod routes;
pub mod service;
pub mod store;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use cache::RenderCache;
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use service::{CacheStatus, MarksheetPdfService, RenderedPdf, ServiceError};
pub use store::{JsonFileStore, MarksheetStore, PushSubscription, StoreError, User};

/// Shared handler state
pub struct AppState<S> {
    pub service: Arc<MarksheetPdfService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(service: MarksheetPdfService<S>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// The full router with request tracing and permissive CORS
pub fn app<S: MarksheetStore>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/api/generate-pdf",
            get(routes::generate_pdf::download::<S>)
                .post(routes::generate_pdf::export::<S>)
                .options(routes::preflight)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/api/subscription-check",
            post(routes::subscription::check::<S>)
                .options(routes::preflight)
                .fallback(routes::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
