use crate::{Marksheet, MarksheetError, Result, SignatureSet};
use std::fmt;
use std::str::FromStr;

/// Turns a marksheet into PDF bytes
///
/// Implementations are blocking; async callers should run them on a
/// blocking thread.
pub trait MarksheetRenderer: Send + Sync {
    fn render(&self, marksheet: &Marksheet, signatures: &SignatureSet) -> Result<Vec<u8>>;

    /// Release long-lived resources such as a browser process
    fn shutdown(&self) {}
}

/// Which renderer strategy to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererKind {
    #[default]
    Layout,
    Browser,
}

impl FromStr for RendererKind {
    type Err = MarksheetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "layout" | "pdfkit" => Ok(RendererKind::Layout),
            "browser" | "html" | "chrome" => Ok(RendererKind::Browser),
            other => Err(MarksheetError::Config(format!(
                "unknown renderer '{other}', expected 'layout' or 'browser'"
            ))),
        }
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RendererKind::Layout => "layout",
            RendererKind::Browser => "browser",
        })
    }
}
