//! Headless-browser renderer
//!
//! The HTML document is written to a temporary file, loaded into a tab of a
//! shared Chromium process and printed to PDF. Chromium refuses navigations
//! to data URLs above 2 MB, which inlined signatures easily exceed. One
//! browser is kept per [`BrowserManager`]; it is reused while it answers a
//! version check and relaunched otherwise.

use crate::html::{HtmlDocument, READY_SELECTOR};
use crate::{Marksheet, MarksheetError, MarksheetRenderer, Result, SignatureSet};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Flags for running inside containers and other restricted sandboxes
pub const LAUNCH_FLAGS: [&str; 6] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-zygote",
    "--single-process",
];

/// A4 in inches
const PAPER_WIDTH_IN: f64 = 8.27;
const PAPER_HEIGHT_IN: f64 = 11.69;
const PAGE_MARGIN_IN: f64 = 0.4;

#[cfg(target_os = "macos")]
const PLATFORM_EXECUTABLES: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(target_os = "windows")]
const PLATFORM_EXECUTABLES: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_EXECUTABLES: &[&str] = &[
    "/usr/bin/google-chrome-stable",
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

/// Browser launch and page-load settings
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Explicit executable (`PUPPETEER_EXECUTABLE_PATH`)
    pub executable_override: Option<PathBuf>,
    /// System browser binary (`CHROME_BIN`)
    pub system_browser: Option<PathBuf>,
    /// Upper bound on waiting for the document body
    pub content_timeout: Duration,
    /// How long an unused browser stays alive before exiting
    pub idle_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable_override: None,
            system_browser: None,
            content_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60 * 60),
        }
    }
}

impl BrowserConfig {
    /// Pick the executable: explicit override, system browser, then the
    /// first platform install location that exists. `None` leaves discovery
    /// to the browser library.
    pub fn resolve_executable<F>(&self, exists: F) -> Option<PathBuf>
    where
        F: Fn(&Path) -> bool,
    {
        if let Some(path) = &self.executable_override {
            return Some(path.clone());
        }
        if let Some(path) = &self.system_browser {
            return Some(path.clone());
        }
        PLATFORM_EXECUTABLES
            .iter()
            .map(Path::new)
            .find(|p| exists(p))
            .map(Path::to_path_buf)
    }
}

fn browser_error(context: &str, err: impl std::fmt::Display) -> MarksheetError {
    MarksheetError::Browser(format!("{context}: {err}"))
}

/// Owns the shared browser process
pub struct BrowserManager {
    config: BrowserConfig,
    browser: Mutex<Option<Browser>>,
}

impl BrowserManager {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            browser: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// The live browser, launching one if none is connected
    ///
    /// The lock is held only while probing or launching.
    pub fn browser(&self) -> Result<Browser> {
        let mut slot = self
            .browser
            .lock()
            .map_err(|_| MarksheetError::Browser("browser lock poisoned".to_string()))?;

        if let Some(browser) = slot.as_ref() {
            if browser.get_version().is_ok() {
                return Ok(browser.clone());
            }
            warn!("browser stopped responding, relaunching");
            *slot = None;
        }

        let browser = self.launch()?;
        *slot = Some(browser.clone());
        Ok(browser)
    }

    fn launch(&self) -> Result<Browser> {
        let path = self.config.resolve_executable(Path::exists);
        info!(executable = ?path, "launching headless browser");

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(path)
            .idle_browser_timeout(self.config.idle_timeout)
            .args(LAUNCH_FLAGS.iter().map(|flag| OsStr::new(*flag)).collect())
            .build()
            .map_err(|e| browser_error("invalid launch options", e))?;

        Browser::new(options).map_err(|e| browser_error("failed to launch browser", e))
    }

    pub fn is_running(&self) -> bool {
        self.browser.lock().map(|b| b.is_some()).unwrap_or(false)
    }

    /// Drop the browser, ending its process
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.browser.lock() {
            if slot.take().is_some() {
                info!("headless browser shut down");
            }
        }
    }
}

/// A rendered page on disk, removed when dropped
pub struct StagedPage {
    file: tempfile::NamedTempFile,
}

impl StagedPage {
    pub fn write(html: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("marksheet-")
            .suffix(".html")
            .tempfile()?;
        file.write_all(html.as_bytes())?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn url(&self) -> String {
        file_url(self.path())
    }
}

fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

/// Renders marksheets by printing the HTML document in a headless browser
pub struct BrowserRenderer {
    manager: Arc<BrowserManager>,
    document: HtmlDocument,
}

impl BrowserRenderer {
    pub fn new(manager: Arc<BrowserManager>, document: HtmlDocument) -> Self {
        Self { manager, document }
    }

    pub fn manager(&self) -> &Arc<BrowserManager> {
        &self.manager
    }

    fn print_options() -> PrintToPdfOptions {
        PrintToPdfOptions {
            paper_width: Some(PAPER_WIDTH_IN),
            paper_height: Some(PAPER_HEIGHT_IN),
            margin_top: Some(PAGE_MARGIN_IN),
            margin_bottom: Some(PAGE_MARGIN_IN),
            margin_left: Some(PAGE_MARGIN_IN),
            margin_right: Some(PAGE_MARGIN_IN),
            print_background: Some(true),
            ..Default::default()
        }
    }

    /// Load `url`, wait until the sheet is parsed through its last element
    /// (images may still be loading) and print
    fn capture(&self, tab: &Tab, url: &str) -> Result<Vec<u8>> {
        let timeout = self.manager.config().content_timeout;
        tab.set_default_timeout(timeout);
        tab.navigate_to(url)
            .map_err(|e| browser_error("failed to load document", e))?;
        tab.wait_for_element_with_custom_timeout(READY_SELECTOR, timeout)
            .map_err(|e| browser_error("marksheet did not render", e))?;
        tab.print_to_pdf(Some(Self::print_options()))
            .map_err(|e| browser_error("print to PDF failed", e))
    }
}

impl MarksheetRenderer for BrowserRenderer {
    fn render(&self, marksheet: &Marksheet, signatures: &SignatureSet) -> Result<Vec<u8>> {
        let generated_at = chrono::Local::now()
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string();
        let html = self.document.render(marksheet, signatures, &generated_at)?;
        let page = StagedPage::write(&html)?;
        debug!(path = %page.path().display(), bytes = html.len(), "staged marksheet page");

        let browser = self.manager.browser()?;
        let tab = browser
            .new_tab()
            .map_err(|e| browser_error("failed to open tab", e))?;

        let result = self.capture(&tab, &page.url());
        if let Err(err) = tab.close(true) {
            debug!(error = %err, "failed to close tab");
        }
        result
    }

    fn shutdown(&self) {
        self.manager.shutdown();
    }
}
