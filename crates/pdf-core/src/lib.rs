//! PDF Core - page layout primitives
//!
//! This crate provides functionality for:
//! - Building PDF documents from scratch, page by page
//! - Drawing text with the standard Helvetica faces and their metrics
//! - Measuring and wrapping text to a box width
//! - Stroking lines and rectangles
//! - Inserting images (JPEG, PNG)
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, PageSize, PdfDocument, StandardFont};
//!
//! let mut doc = PdfDocument::new(PageSize::A4);
//! let page = doc.add_page();
//! doc.set_font(StandardFont::HelveticaBold, 16.0);
//! doc.text_box("Hello, World!", page, 40.0, 40.0, 515.0, Align::Center)?;
//! let bytes = doc.into_bytes()?;
//! ```

mod document;
mod font;
mod graphics;
mod image;
mod text;

pub use document::{Color, PageSize, PdfDocument};
pub use font::StandardFont;
pub use graphics::{generate_line_operators, generate_rect_operators, StrokeStyle};
pub use image::{calculate_scaled_dimensions, ImageScaleMode};
pub use text::{text_operators, wrap_to_width, TextStyle};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}
