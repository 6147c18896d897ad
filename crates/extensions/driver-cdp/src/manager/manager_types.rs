//! Manager errors and configuration.

use std::path::PathBuf;

use thiserror::Error;
use webpilot_config::{BrowserProfile, Config, ConfigLoader};
use webpilot_protocols::DriverError;

use crate::cdp::{CdpError, CookieParam};

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Browser not connected")]
    NotConnected,

    #[error("{0} not found. Install it or set browser.executable")]
    BrowserNotFound(String),

    #[error("Failed to launch {browser}: {message}")]
    LaunchFailed { browser: String, message: String },
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ConnectionFailed(msg) | CdpError::BrowserNotAvailable(msg) => {
                BrowserError::ConnectionFailed(msg)
            }
            CdpError::NavigationFailed(msg) => BrowserError::NavigationFailed(msg),
            CdpError::ElementNotFound(msg) => BrowserError::ElementNotFound(msg),
            CdpError::JavaScript(msg) => BrowserError::ActionFailed(format!("JS error: {}", msg)),
            CdpError::Timeout(msg) => BrowserError::ActionFailed(format!("Timeout: {}", msg)),
            CdpError::SessionClosed => BrowserError::NotConnected,
            _ => BrowserError::ActionFailed(e.to_string()),
        }
    }
}

impl From<BrowserError> for DriverError {
    fn from(e: BrowserError) -> Self {
        match e {
            BrowserError::NotConnected => DriverError::NotConnected,
            BrowserError::BrowserNotFound(_) | BrowserError::LaunchFailed { .. } => {
                DriverError::LaunchFailed(e.to_string())
            }
            BrowserError::ConnectionFailed(msg) => DriverError::Unavailable(msg),
            other => DriverError::Other(other.to_string()),
        }
    }
}

/// How to find, launch and prepare the browser.
#[derive(Debug, Clone)]
pub struct BrowserManagerConfig {
    /// Browser family: chrome, chromium, edge or brave.
    pub browser: String,
    /// Explicit executable; searched for when unset.
    pub executable: Option<PathBuf>,
    pub debug_port: u16,
    /// `--user-data-dir`. Defaults to a per-browser dir under the data dir.
    pub user_data_dir: Option<PathBuf>,
    pub headless: bool,
    /// Extra launch arguments from the browser profile.
    pub extra_args: Vec<String>,
    /// Cookies installed into every new page.
    pub cookies: Vec<CookieParam>,
}

impl Default for BrowserManagerConfig {
    fn default() -> Self {
        Self {
            browser: "chrome".to_string(),
            executable: None,
            debug_port: 9222,
            user_data_dir: None,
            headless: false,
            extra_args: Vec::new(),
            cookies: Vec::new(),
        }
    }
}

impl BrowserManagerConfig {
    /// Build from the app config and the browser's saved profile.
    pub fn from_config(config: &Config, profile: &BrowserProfile) -> Self {
        let browser = &config.browser;
        let name = browser.name.to_lowercase();
        let user_data_dir = match &browser.profile_dir {
            Some(dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
            None => config.data_dir().join("browser-data").join(&name),
        };

        Self {
            executable: browser
                .executable
                .as_deref()
                .map(|p| PathBuf::from(ConfigLoader::expand_path(p))),
            debug_port: browser.debug_port,
            user_data_dir: Some(user_data_dir),
            headless: browser.headless,
            extra_args: profile.launch_args(&name),
            cookies: profile.cookies.iter().map(CookieParam::from).collect(),
            browser: name,
        }
    }

    pub fn user_data_dir(&self) -> PathBuf {
        self.user_data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("webpilot")
                .join("browser-data")
                .join(&self.browser)
        })
    }

    /// CDP HTTP endpoint.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }

    /// Full argument list for the browser process.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debug_port),
            format!("--user-data-dir={}", self.user_data_dir().display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-background-networking".to_string(),
            "--disable-sync".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}
