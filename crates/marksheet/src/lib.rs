//! Marksheet rendering
//!
//! This crate provides:
//! - The marksheet data model as stored and exchanged as JSON
//! - Layout configuration, including the department name table
//! - Signature image decoding
//! - The [`MarksheetRenderer`] trait with two strategies: a page-layout
//!   renderer built on `pdf-core` and a headless-browser renderer that prints
//!   an HTML document
//!
//! # Example
//!
//! ```ignore
//! use marksheet::{LayoutConfig, LayoutRenderer, Marksheet, MarksheetRenderer, SignatureSet};
//!
//! let marksheet: Marksheet = serde_json::from_str(json)?;
//! let renderer = LayoutRenderer::new(LayoutConfig::default());
//! let pdf = renderer.render(&marksheet, &SignatureSet::default())?;
//! ```

pub mod browser;
pub mod config;
mod format;
pub mod html;
pub mod layout;
mod model;
mod renderer;
mod signature;

pub use browser::{BrowserConfig, BrowserManager, BrowserRenderer, StagedPage};
pub use config::{DepartmentTable, HeaderLine, LayoutConfig, SignatureRole};
pub use format::{exam_title, format_marks, year_semester};
pub use html::{HtmlDocument, READY_SELECTOR};
pub use layout::LayoutRenderer;
pub use model::{Marks, Marksheet, MarksheetRecord, StaffMember, StudentDetails, SubjectResult};
pub use renderer::{MarksheetRenderer, RendererKind};
pub use signature::{SignatureImage, SignatureSet};

use thiserror::Error;

/// Errors that can occur while rendering a marksheet
#[derive(Debug, Error)]
pub enum MarksheetError {
    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tera::Error> for MarksheetError {
    fn from(err: tera::Error) -> Self {
        // tera keeps the useful part of the message in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        MarksheetError::Template(message)
    }
}

/// Result type for marksheet operations
pub type Result<T> = std::result::Result<T, MarksheetError>;
