//! Environment configuration

use crate::cache::{RenderCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use marksheet::{
    BrowserConfig, BrowserManager, BrowserRenderer, HtmlDocument, LayoutConfig, LayoutRenderer,
    MarksheetRenderer, RendererKind, SignatureImage,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DATA_PATH: &str = "data/store.json";
pub const DEFAULT_LOGO_PATH: &str = "public/images/mseclogo.png";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_path: PathBuf,
    pub renderer: RendererKind,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub principal_signature: Option<SignatureImage>,
    pub logo_path: PathBuf,
    pub layout_config_path: Option<PathBuf>,
    pub browser: BrowserConfig,
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

/// Principal signature from a URL, a data URI, bare base64 or a local
/// image file (`file://` prefix or an existing path)
fn principal_signature(value: String) -> Result<Option<SignatureImage>, ConfigError> {
    const KEY: &str = "PRINCIPAL_SIGNATURE_URL";
    let trimmed = value.trim();
    let path = match trimmed.strip_prefix("file://") {
        Some(path) => Path::new(path),
        None if !trimmed.starts_with("data:") && Path::new(trimmed).is_file() => Path::new(trimmed),
        None => return Ok(SignatureImage::new(trimmed)),
    };
    let signature = SignatureImage::from_file(path).map_err(|e| ConfigError::Invalid {
        key: KEY,
        reason: e.to_string(),
        value: value.clone(),
    })?;
    if signature.is_none() {
        warn!(path = %path.display(), "principal signature file is empty");
    }
    Ok(signature)
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse(
            "BIND_ADDR",
            var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;
        let renderer = match var("PDF_RENDERER") {
            Some(v) => parse("PDF_RENDERER", v)?,
            None => RendererKind::default(),
        };
        let cache_ttl = match var("PDF_CACHE_TTL_SECS") {
            Some(v) => Duration::from_secs(parse("PDF_CACHE_TTL_SECS", v)?),
            None => DEFAULT_TTL,
        };
        let cache_max_entries = match var("PDF_CACHE_MAX_ENTRIES") {
            Some(v) => parse("PDF_CACHE_MAX_ENTRIES", v)?,
            None => DEFAULT_MAX_ENTRIES,
        };

        let mut browser = BrowserConfig {
            executable_override: var("PUPPETEER_EXECUTABLE_PATH").map(PathBuf::from),
            system_browser: var("CHROME_BIN").map(PathBuf::from),
            ..Default::default()
        };
        if let Some(v) = var("BROWSER_CONTENT_TIMEOUT_MS") {
            browser.content_timeout =
                Duration::from_millis(parse("BROWSER_CONTENT_TIMEOUT_MS", v)?);
        }

        let principal_signature = match var("PRINCIPAL_SIGNATURE_URL") {
            Some(v) => principal_signature(v)?,
            None => None,
        };

        Ok(Self {
            bind_addr,
            data_path: var("MARKSHEET_DATA_PATH")
                .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())
                .into(),
            renderer,
            cache_ttl,
            cache_max_entries,
            principal_signature,
            logo_path: var("LOGO_PATH")
                .unwrap_or_else(|| DEFAULT_LOGO_PATH.to_string())
                .into(),
            layout_config_path: var("LAYOUT_CONFIG_PATH").map(PathBuf::from),
            browser,
        })
    }

    pub fn cache(&self) -> RenderCache {
        RenderCache::new(self.cache_ttl, self.cache_max_entries)
    }

    pub fn layout_config(&self) -> marksheet::Result<LayoutConfig> {
        match &self.layout_config_path {
            Some(path) => LayoutConfig::from_json_file(path),
            None => Ok(LayoutConfig::default()),
        }
    }

    /// The configured rendering strategy
    ///
    /// A missing logo only produces a warning. The browser is not launched
    /// until the first render.
    pub fn build_renderer(&self) -> marksheet::Result<Arc<dyn MarksheetRenderer>> {
        let layout = self.layout_config()?;
        info!(renderer = %self.renderer, "configuring PDF renderer");

        Ok(match self.renderer {
            RendererKind::Layout => {
                Arc::new(LayoutRenderer::new(layout).with_logo_file(&self.logo_path))
            }
            RendererKind::Browser => {
                let mut document = HtmlDocument::new(layout)?;
                match std::fs::read(&self.logo_path) {
                    Ok(bytes) => document = document.with_logo(&bytes),
                    Err(err) => {
                        warn!(path = %self.logo_path.display(), error = %err, "logo not loaded")
                    }
                }
                let manager = Arc::new(BrowserManager::new(self.browser.clone()));
                Arc::new(BrowserRenderer::new(manager, document))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.data_path, PathBuf::from("data/store.json"));
        assert_eq!(config.renderer, RendererKind::Layout);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.cache_max_entries, 50);
        assert_eq!(config.principal_signature, None);
        assert_eq!(config.browser.content_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("PDF_RENDERER", "browser"),
            ("PDF_CACHE_TTL_SECS", "60"),
            ("PDF_CACHE_MAX_ENTRIES", "5"),
            ("PUPPETEER_EXECUTABLE_PATH", "/opt/chrome"),
            ("CHROME_BIN", ""),
            ("PRINCIPAL_SIGNATURE_URL", "https://cdn.example.org/sig.png"),
            ("BROWSER_CONTENT_TIMEOUT_MS", "5000"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.renderer, RendererKind::Browser);
        assert_eq!(config.cache().ttl(), Duration::from_secs(60));
        assert_eq!(config.cache().max_entries(), 5);
        assert_eq!(config.browser.executable_override, Some(PathBuf::from("/opt/chrome")));
        assert_eq!(config.browser.system_browser, None);
        assert!(config.principal_signature.unwrap().is_remote());
        assert_eq!(config.browser.content_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_invalid_value_names_key() {
        let err = config_from(&[("PDF_CACHE_TTL_SECS", "five")]).unwrap_err();
        assert!(err.to_string().contains("PDF_CACHE_TTL_SECS"));
        assert!(config_from(&[("PDF_RENDERER", "wkhtml")]).is_err());
    }

    #[test]
    fn test_principal_signature_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("principal.png");
        let png = b"\x89PNG\r\n\x1a\nrest-of-image".to_vec();
        std::fs::write(&path, &png).unwrap();
        let path = path.to_str().unwrap().to_string();

        for value in [path.clone(), format!("file://{path}")] {
            let config = config_from(&[("PRINCIPAL_SIGNATURE_URL", &value)]).unwrap();
            let sig = config.principal_signature.unwrap();
            assert!(sig.source().starts_with("data:image/png;base64,"));
            assert_eq!(sig.decode(), Some(png.clone()));
        }

        let missing = format!("file://{}/missing.png", dir.path().display());
        let err = config_from(&[("PRINCIPAL_SIGNATURE_URL", &missing)]).unwrap_err();
        assert!(err.to_string().contains("PRINCIPAL_SIGNATURE_URL"));

        let config = config_from(&[("PRINCIPAL_SIGNATURE_URL", "SGVsbG8=")]).unwrap();
        assert_eq!(config.principal_signature.unwrap().decode(), Some(b"Hello".to_vec()));
    }

    #[test]
    fn test_layout_renderer_without_logo() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_from(&[]).unwrap();
        config.logo_path = dir.path().join("missing.png");
        assert!(config.build_renderer().is_ok());
    }

    #[test]
    fn test_bad_layout_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        std::fs::write(&path, "{ \"margin\": ").unwrap();
        let mut config = config_from(&[]).unwrap();
        config.layout_config_path = Some(path);
        assert!(config.build_renderer().is_err());
    }
}
