//! BrowserManager: discovery, launch, connection and the active page.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{BrowserError, BrowserManagerConfig};
use crate::cdp::{CdpClient, PageSession, fetch_version};

const STARTUP_POLL: Duration = Duration::from_millis(200);
const STARTUP_ATTEMPTS: u32 = 50;

/// Owns the browser connection and the page actions run against.
pub struct BrowserManager {
    config: BrowserManagerConfig,
    client: RwLock<Option<Arc<CdpClient>>>,
    page: RwLock<Option<Arc<PageSession>>>,
    /// Set only when this manager started the browser.
    process: Mutex<Option<Child>>,
}

impl BrowserManager {
    pub fn new(config: BrowserManagerConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            page: RwLock::new(None),
            process: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BrowserManagerConfig {
        &self.config
    }

    /// Executable names looked up on `PATH` for a browser family.
    pub(super) fn binary_names(browser: &str) -> &'static [&'static str] {
        match browser {
            "chromium" => &["chromium", "chromium-browser"],
            "edge" => &["microsoft-edge", "microsoft-edge-stable", "msedge"],
            "brave" => &["brave-browser", "brave"],
            "firefox" => &["firefox"],
            _ => &["google-chrome", "google-chrome-stable", "chrome", "chromium"],
        }
    }

    /// Well-known install locations for a browser family on this OS.
    #[allow(unused_variables)]
    pub(super) fn install_paths(browser: &str) -> Vec<PathBuf> {
        #[allow(unused_mut)]
        let mut paths: Vec<&str> = Vec::new();

        #[cfg(target_os = "macos")]
        paths.extend(match browser {
            "chromium" => &["/Applications/Chromium.app/Contents/MacOS/Chromium"][..],
            "edge" => &["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"][..],
            "brave" => &["/Applications/Brave Browser.app/Contents/MacOS/Brave Browser"][..],
            "firefox" => &["/Applications/Firefox.app/Contents/MacOS/firefox"][..],
            _ => &["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"][..],
        });

        #[cfg(target_os = "linux")]
        paths.extend(match browser {
            "chromium" => &["/usr/bin/chromium", "/usr/bin/chromium-browser", "/snap/bin/chromium"][..],
            "edge" => &["/usr/bin/microsoft-edge", "/usr/bin/microsoft-edge-stable"][..],
            "brave" => &["/usr/bin/brave-browser", "/snap/bin/brave"][..],
            "firefox" => &["/usr/bin/firefox", "/snap/bin/firefox"][..],
            _ => &["/usr/bin/google-chrome", "/usr/bin/google-chrome-stable"][..],
        });

        #[cfg(target_os = "windows")]
        paths.extend(match browser {
            "edge" => &[r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe"][..],
            "brave" => &[r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe"][..],
            "firefox" => &[r"C:\Program Files\Mozilla Firefox\firefox.exe"][..],
            _ => &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ][..],
        });

        paths.into_iter().map(PathBuf::from).collect()
    }

    /// Locate a browser executable: install locations first, then `PATH`.
    pub fn find_browser(browser: &str) -> Option<PathBuf> {
        let browser = browser.to_lowercase();
        if let Some(path) = Self::install_paths(&browser).into_iter().find(|p| p.exists()) {
            return Some(path);
        }
        let path_var = std::env::var_os("PATH")?;
        std::env::split_paths(&path_var).find_map(|dir| {
            Self::binary_names(&browser).iter().find_map(|name| {
                let candidate = dir.join(name);
                let with_exe = candidate.with_extension("exe");
                [candidate, with_exe].into_iter().find(|p| p.is_file())
            })
        })
    }

    async fn is_browser_running(&self) -> bool {
        fetch_version(&self.config.endpoint()).await.is_ok()
    }

    async fn launch(&self) -> Result<Child, BrowserError> {
        let executable = match &self.config.executable {
            Some(path) => path.clone(),
            None => Self::find_browser(&self.config.browser)
                .ok_or_else(|| BrowserError::BrowserNotFound(self.config.browser.clone()))?,
        };
        let user_data_dir = self.config.user_data_dir();
        if let Err(e) = std::fs::create_dir_all(&user_data_dir) {
            warn!("Failed to create user data directory: {}", e);
        }

        info!(
            "Launching {} with user data at {}",
            executable.display(),
            user_data_dir.display()
        );

        let child = Command::new(&executable)
            .args(self.config.launch_args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed {
                browser: self.config.browser.clone(),
                message: e.to_string(),
            })?;

        info!("Browser launched with PID: {:?}", child.id());
        Ok(child)
    }

    /// Connect, launching the browser first if nothing listens on the port.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        let mut client = self.client.write().await;
        if client.is_some() {
            return Ok(());
        }

        if self.is_browser_running().await {
            info!("Browser already running on port {}", self.config.debug_port);
        } else {
            info!(
                "No browser on port {}, launching {}",
                self.config.debug_port, self.config.browser
            );
            let child = self.launch().await?;
            *self.process.lock().await = Some(child);

            let mut ready = false;
            for _ in 0..STARTUP_ATTEMPTS {
                tokio::time::sleep(STARTUP_POLL).await;
                if self.is_browser_running().await {
                    ready = true;
                    break;
                }
            }
            if !ready {
                return Err(BrowserError::LaunchFailed {
                    browser: self.config.browser.clone(),
                    message: "browser did not open its debugging port in time".to_string(),
                });
            }
        }

        let connected = CdpClient::connect(&self.config.endpoint()).await?;
        info!("Connected to {} at {}", connected.browser(), self.config.endpoint());
        *client = Some(Arc::new(connected));
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }

    async fn client(&self) -> Result<Arc<CdpClient>, BrowserError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)
    }

    /// The active page, opening one (and the browser) on first use.
    pub async fn page(&self) -> Result<Arc<PageSession>, BrowserError> {
        if let Some(page) = self.page.read().await.clone() {
            return Ok(page);
        }

        self.connect().await?;
        let mut slot = self.page.write().await;
        if let Some(page) = slot.clone() {
            return Ok(page);
        }

        let session = self.client().await?.new_page(None).await?;
        if let Err(e) = session.set_cookies(&self.config.cookies).await {
            warn!("Failed to install profile cookies: {}", e);
        }
        debug!("Opened page {}", session.target_id());

        let session = Arc::new(session);
        *slot = Some(session.clone());
        Ok(session)
    }

    /// The active page if one is open. Never launches anything.
    pub async fn current_page(&self) -> Option<Arc<PageSession>> {
        self.page.read().await.clone()
    }

    /// Close the page and the connection. The browser keeps running.
    pub async fn close(&self) -> Result<(), BrowserError> {
        let page = self.page.write().await.take();
        let client = self.client.write().await.take();
        if let (Some(page), Some(client)) = (&page, &client) {
            if let Err(e) = client.close_page(page.target_id()).await {
                debug!("Closing page failed: {}", e);
            }
        }
        if let Some(client) = client {
            client.disconnect().await;
            info!("Browser connection closed");
        }
        Ok(())
    }

    /// Close, then kill the browser if this manager launched it.
    pub async fn shutdown(&self) -> Result<(), BrowserError> {
        self.close().await?;
        if let Some(mut child) = self.process.lock().await.take() {
            info!("Shutting down browser");
            if let Err(e) = child.kill().await {
                warn!("Failed to kill browser process: {}", e);
            }
        }
        Ok(())
    }
}
