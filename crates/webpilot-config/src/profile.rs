//! Per-browser profiles: proxy, extensions, user agent, window size and
//! cookies, persisted as `<base>/<browser>/config.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ProfileError;

/// Proxy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "type", default = "default_proxy_type")]
    pub proxy_type: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            proxy_type: default_proxy_type(),
            host: String::new(),
            port: 0,
            username: String::new(),
            password: String::new(),
        }
    }
}

fn default_proxy_type() -> String {
    "http".to_string()
}

impl ProxyConfig {
    /// `type://[user:pass@]host:port`.
    pub fn url(&self) -> String {
        let mut url = format!("{}://", self.proxy_type);
        if !self.username.is_empty() && !self.password.is_empty() {
            url.push_str(&format!("{}:{}@", self.username, self.password));
        }
        url.push_str(&format!("{}:{}", self.host, self.port));
        url
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// A cookie to install in the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub domain: String,
    pub name: String,
    pub value: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(rename = "httpOnly", default)]
    pub http_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl Cookie {
    pub fn new(
        domain: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
            value: value.into(),
            path: default_cookie_path(),
            secure: false,
            http_only: false,
            expiry: None,
        }
    }
}

/// Persisted configuration of one browser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowserProfile {
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Paths of the copied extensions.
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub window_size: WindowSize,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
}

impl BrowserProfile {
    /// Command-line arguments for launching `browser` with this profile.
    pub fn launch_args(&self, browser: &str) -> Vec<String> {
        let browser = browser.to_lowercase();
        if browser == "firefox" {
            // Firefox reads these from its own profile.
            return if self.proxy.enabled {
                vec!["-P".to_string(), "proxy".to_string()]
            } else {
                Vec::new()
            };
        }
        if !is_chrome_family(&browser) {
            return Vec::new();
        }

        let mut args = Vec::new();
        if self.proxy.enabled {
            args.push(format!("--proxy-server={}", self.proxy.url()));
        }
        if !self.extensions.is_empty() {
            args.push(format!("--load-extension={}", self.extensions.join(",")));
        }
        if !self.user_agent.is_empty() {
            args.push(format!("--user-agent={}", self.user_agent));
        }
        args.push(format!(
            "--window-size={},{}",
            self.window_size.width, self.window_size.height
        ));
        args
    }

    /// Extension names (basenames of the copied paths).
    pub fn extension_names(&self) -> Vec<String> {
        self.extensions.iter().map(|p| basename(p)).collect()
    }
}

fn is_chrome_family(browser: &str) -> bool {
    matches!(browser, "chrome" | "chromium" | "edge" | "brave")
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// `{success, message}` returned by every profile mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileOutcome {
    pub success: bool,
    pub message: String,
}

impl ProfileOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Loads, caches and saves browser profiles.
#[derive(Debug)]
pub struct ProfileStore {
    base_dir: PathBuf,
    profiles: Mutex<HashMap<String, BrowserProfile>>,
}

impl ProfileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            profiles: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory of one browser's profile.
    pub fn browser_dir(&self, browser: &str) -> PathBuf {
        self.base_dir.join(browser.to_lowercase())
    }

    /// Snapshot of a browser's profile.
    pub fn profile(&self, browser: &str) -> BrowserProfile {
        let mut profiles = self.profiles.lock();
        self.cached(&mut profiles, browser).clone()
    }

    pub fn proxy(&self, browser: &str) -> ProxyConfig {
        self.profile(browser).proxy
    }

    pub fn extensions(&self, browser: &str) -> Vec<String> {
        self.profile(browser).extension_names()
    }

    pub fn user_agent(&self, browser: &str) -> String {
        self.profile(browser).user_agent
    }

    pub fn window_size(&self, browser: &str) -> WindowSize {
        self.profile(browser).window_size
    }

    pub fn cookies(&self, browser: &str) -> Vec<Cookie> {
        self.profile(browser).cookies
    }

    pub fn launch_args(&self, browser: &str) -> Vec<String> {
        self.profile(browser).launch_args(browser)
    }

    pub fn set_proxy(
        &self,
        browser: &str,
        proxy_type: &str,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<ProfileOutcome, ProfileError> {
        self.update(browser, |profile, _| {
            profile.proxy = ProxyConfig {
                enabled: true,
                proxy_type: proxy_type.to_string(),
                host: host.to_string(),
                port,
                username: username.to_string(),
                password: password.to_string(),
            };
            Ok(ProfileOutcome::ok(format!(
                "Set proxy configuration: {}://{}:{}",
                proxy_type, host, port
            )))
        })
    }

    pub fn disable_proxy(&self, browser: &str) -> Result<ProfileOutcome, ProfileError> {
        self.update(browser, |profile, _| {
            profile.proxy.enabled = false;
            Ok(ProfileOutcome::ok("Disabled proxy configuration"))
        })
    }

    /// Copy an extension file or directory into the profile.
    pub fn add_extension(
        &self,
        browser: &str,
        extension_path: &Path,
    ) -> Result<ProfileOutcome, ProfileError> {
        if !extension_path.exists() {
            return Ok(ProfileOutcome::fail(format!(
                "Extension not found: {}",
                extension_path.display()
            )));
        }
        let name = basename(&extension_path.to_string_lossy());

        self.update(browser, |profile, dir| {
            let extensions_dir = dir.join("extensions");
            fs::create_dir_all(&extensions_dir)?;
            let dest = extensions_dir.join(&name);

            if extension_path.is_dir() {
                if dest.exists() {
                    fs::remove_dir_all(&dest)?;
                }
                copy_dir(extension_path, &dest)?;
            } else {
                fs::copy(extension_path, &dest)?;
            }

            let dest = dest.to_string_lossy().into_owned();
            if !profile.extensions.contains(&dest) {
                profile.extensions.push(dest);
            }
            info!("Added extension {} to {} profile", name, browser);
            Ok(ProfileOutcome::ok(format!("Added extension: {}", name)))
        })
    }

    pub fn remove_extension(&self, browser: &str, name: &str) -> Result<ProfileOutcome, ProfileError> {
        self.update(browser, |profile, _| {
            let Some(index) = profile.extensions.iter().position(|p| basename(p) == name) else {
                return Ok(ProfileOutcome::fail(format!("Extension not found: {}", name)));
            };
            let path = PathBuf::from(profile.extensions.remove(index));
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else if path.exists() {
                fs::remove_file(&path)?;
            }
            Ok(ProfileOutcome::ok(format!("Removed extension: {}", name)))
        })
    }

    pub fn set_user_agent(&self, browser: &str, user_agent: &str) -> Result<ProfileOutcome, ProfileError> {
        self.update(browser, |profile, _| {
            profile.user_agent = user_agent.to_string();
            Ok(ProfileOutcome::ok(format!("Set user agent: {}", user_agent)))
        })
    }

    pub fn set_window_size(
        &self,
        browser: &str,
        width: u32,
        height: u32,
    ) -> Result<ProfileOutcome, ProfileError> {
        self.update(browser, |profile, _| {
            profile.window_size = WindowSize { width, height };
            Ok(ProfileOutcome::ok(format!("Set window size: {}x{}", width, height)))
        })
    }

    /// Insert or replace the cookie with the same domain and name.
    pub fn add_cookie(&self, browser: &str, cookie: Cookie) -> Result<ProfileOutcome, ProfileError> {
        self.update(browser, |profile, _| {
            let message = format!("Added cookie: {} for {}", cookie.name, cookie.domain);
            match profile
                .cookies
                .iter_mut()
                .find(|c| c.domain == cookie.domain && c.name == cookie.name)
            {
                Some(existing) => *existing = cookie,
                None => profile.cookies.push(cookie),
            }
            Ok(ProfileOutcome::ok(message))
        })
    }

    pub fn remove_cookie(
        &self,
        browser: &str,
        domain: &str,
        name: &str,
    ) -> Result<ProfileOutcome, ProfileError> {
        self.update(browser, |profile, _| {
            let before = profile.cookies.len();
            profile
                .cookies
                .retain(|c| !(c.domain == domain && c.name == name));
            if profile.cookies.len() == before {
                return Ok(ProfileOutcome::fail(format!(
                    "Cookie not found: {} for {}",
                    name, domain
                )));
            }
            Ok(ProfileOutcome::ok(format!("Removed cookie: {} for {}", name, domain)))
        })
    }

    /// Apply `f` to the profile and save it when `f` reports success.
    fn update<F>(&self, browser: &str, f: F) -> Result<ProfileOutcome, ProfileError>
    where
        F: FnOnce(&mut BrowserProfile, &Path) -> Result<ProfileOutcome, ProfileError>,
    {
        let dir = self.browser_dir(browser);
        let mut profiles = self.profiles.lock();
        let profile = self.cached(&mut profiles, browser);

        let outcome = f(profile, &dir)?;
        if outcome.success {
            fs::create_dir_all(&dir)?;
            let json = serde_json::to_string_pretty(profile)?;
            fs::write(dir.join("config.json"), json)?;
            debug!("Saved {} profile to {}", browser, dir.display());
        }
        Ok(outcome)
    }

    fn cached<'a>(
        &self,
        profiles: &'a mut HashMap<String, BrowserProfile>,
        browser: &str,
    ) -> &'a mut BrowserProfile {
        let key = browser.to_lowercase();
        profiles
            .entry(key)
            .or_insert_with(|| self.load(browser))
    }

    fn load(&self, browser: &str) -> BrowserProfile {
        let path = self.browser_dir(browser).join("config.json");
        if !path.exists() {
            return BrowserProfile::default();
        }
        match fs::read_to_string(&path)
            .map_err(ProfileError::from)
            .and_then(|s| serde_json::from_str(&s).map_err(ProfileError::from))
        {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Error loading profile {}: {}", path.display(), e);
                BrowserProfile::default()
            }
        }
    }
}

fn copy_dir(src: &Path, dest: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
