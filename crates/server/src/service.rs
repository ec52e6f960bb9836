//! Load, cache and render marksheet PDFs

use crate::cache::RenderCache;
use crate::store::{MarksheetStore, StoreError};
use axum::body::Bytes;
use marksheet::{MarksheetRenderer, SignatureImage, SignatureSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("marksheet not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("render failed: {0}")]
    Render(String),
}

/// A rendered document ready to send
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Bytes,
    pub filename: String,
    pub cache: CacheStatus,
}

pub struct MarksheetPdfService<S> {
    store: S,
    renderer: Arc<dyn MarksheetRenderer>,
    cache: RenderCache,
    principal_signature: Option<SignatureImage>,
}

impl<S: MarksheetStore> MarksheetPdfService<S> {
    pub fn new(
        store: S,
        renderer: Arc<dyn MarksheetRenderer>,
        cache: RenderCache,
        principal_signature: Option<SignatureImage>,
    ) -> Self {
        Self {
            store,
            renderer,
            cache,
            principal_signature,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// The PDF for marksheet `id`, from the cache when fresh
    ///
    /// The record is loaded first so an unknown id is reported even when a
    /// stale entry for it is cached.
    pub async fn generate(&self, id: &str) -> Result<RenderedPdf, ServiceError> {
        let record = self
            .store
            .find_marksheet(id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        let filename = record.marksheet.download_filename();

        if let Some(bytes) = self.cache.get(id) {
            info!(marksheet_id = id, cache = %CacheStatus::Hit, "serving marksheet PDF");
            return Ok(RenderedPdf {
                bytes,
                filename,
                cache: CacheStatus::Hit,
            });
        }

        let signatures = SignatureSet::for_record(&record, self.principal_signature.as_ref());
        let renderer = Arc::clone(&self.renderer);
        let marksheet = record.marksheet;
        let rendered = tokio::task::spawn_blocking(move || renderer.render(&marksheet, &signatures))
            .await
            .map_err(|e| ServiceError::Render(format!("render task failed: {e}")))?;

        let bytes = match rendered {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => {
                error!(marksheet_id = id, error = %err, "failed to render marksheet");
                return Err(ServiceError::Render(err.to_string()));
            }
        };

        self.cache.put(id, bytes.clone());
        info!(
            marksheet_id = id,
            cache = %CacheStatus::Miss,
            size = bytes.len(),
            "serving marksheet PDF"
        );
        Ok(RenderedPdf {
            bytes,
            filename,
            cache: CacheStatus::Miss,
        })
    }

    /// Release renderer resources such as a running browser
    pub fn shutdown(&self) {
        self.renderer.shutdown();
    }
}
