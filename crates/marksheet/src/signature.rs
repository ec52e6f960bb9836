//! Signature images
//!
//! Stored signatures arrive as data URIs, bare base64 or external URLs.
//! Local image files are read once and carried as data URIs. Anything that
//! cannot be turned into image bytes renders as an empty slot.

use crate::config::SignatureRole;
use crate::MarksheetRecord;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use tracing::warn;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Media type from the leading bytes; PNG unless the bytes say JPEG
fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(JPEG_MAGIC) {
        "image/jpeg"
    } else {
        "image/png"
    }
}

/// An optional signature payload as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImage {
    source: String,
}

impl SignatureImage {
    /// `None` for blank input
    pub fn new(source: impl Into<String>) -> Option<Self> {
        let source = source.into().trim().to_string();
        (!source.is_empty()).then_some(Self { source })
    }

    /// Data URI carrying `bytes`; `None` when empty
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        (!bytes.is_empty()).then(|| Self {
            source: format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes)),
        })
    }

    /// Read an image file into a data URI
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Option<Self>> {
        let bytes = std::fs::read(path)?;
        if !bytes.starts_with(PNG_MAGIC) && !bytes.starts_with(JPEG_MAGIC) {
            warn!("signature file is neither PNG nor JPEG");
        }
        Ok(Self::from_bytes(&bytes))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_remote(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }

    /// Base64 payload with any `data:` prefix removed
    fn payload(&self) -> &str {
        match self.source.split_once(',') {
            Some((_, data)) => data,
            None => &self.source,
        }
    }

    /// Image bytes, or `None` when the payload is remote or not valid base64
    pub fn decode(&self) -> Option<Vec<u8>> {
        if self.is_remote() {
            warn!(url = %self.source, "remote signature images are not fetched for page layout");
            return None;
        }
        let cleaned: String = self
            .payload()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        match STANDARD.decode(cleaned.as_bytes()) {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "failed to decode signature image");
                None
            }
        }
    }

    /// Value usable as an `<img src>`: remote URLs and data URIs pass
    /// through, bare base64 gets a data URI with a sniffed media type
    pub fn to_img_src(&self) -> String {
        if self.is_remote() || self.source.starts_with("data:") {
            return self.source.clone();
        }
        let mime = if self.source.starts_with("/9j/") {
            "image/jpeg"
        } else {
            "image/png"
        };
        format!("data:{mime};base64,{}", self.source)
    }
}

/// Signatures for the three slots; any may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureSet {
    pub staff: Option<SignatureImage>,
    pub hod: Option<SignatureImage>,
    pub principal: Option<SignatureImage>,
}

impl SignatureSet {
    /// Signatures from the record's staff references plus the configured
    /// principal signature
    pub fn for_record(record: &MarksheetRecord, principal: Option<&SignatureImage>) -> Self {
        let from_staff = |member: &Option<crate::StaffMember>| {
            member
                .as_ref()
                .and_then(|m| m.e_signature.clone())
                .and_then(SignatureImage::new)
        };
        Self {
            staff: from_staff(&record.staff),
            hod: from_staff(&record.hod),
            principal: principal.cloned(),
        }
    }

    pub fn get(&self, role: SignatureRole) -> Option<&SignatureImage> {
        match role {
            SignatureRole::Staff => self.staff.as_ref(),
            SignatureRole::Hod => self.hod.as_ref(),
            SignatureRole::Principal => self.principal.as_ref(),
        }
    }
}
