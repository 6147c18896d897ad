//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::loader::ConfigLoader;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Overrides the default data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Overrides the default config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<String>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Which backend drives the browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Chrome DevTools Protocol.
    #[default]
    Cdp,
    /// OS-level keyboard and mouse.
    Native,
}

impl DriverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Cdp => "cdp",
            DriverKind::Native => "native",
        }
    }
}

impl std::str::FromStr for DriverKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cdp" => Ok(DriverKind::Cdp),
            "native" => Ok(DriverKind::Native),
            other => Err(ConfigError::InvalidValue {
                field: "browser.driver".to_string(),
                message: format!("unknown driver '{}', expected cdp or native", other),
            }),
        }
    }
}

/// Browser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Browser name: chrome, chromium, edge, firefox.
    #[serde(default = "default_browser_name")]
    pub name: String,

    #[serde(default)]
    pub driver: DriverKind,

    #[serde(default)]
    pub headless: bool,

    /// Delay between input events in milliseconds.
    #[serde(default = "default_slow_mo")]
    pub slow_mo: u64,

    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Chrome user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<String>,

    /// Explicit browser executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            name: default_browser_name(),
            driver: DriverKind::default(),
            headless: false,
            slow_mo: default_slow_mo(),
            debug_port: default_debug_port(),
            profile_dir: None,
            executable: None,
        }
    }
}

fn default_browser_name() -> String {
    "chrome".to_string()
}

fn default_slow_mo() -> u64 {
    50
}

fn default_debug_port() -> u16 {
    9222
}

/// LLM command parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl LlmConfig {
    /// True when LLM parsing is switched on and has a key.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    500
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

/// Task scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            error_backoff_secs: default_error_backoff(),
            config_dir: None,
        }
    }
}

fn default_check_interval() -> u64 {
    1
}

fn default_error_backoff() -> u64 {
    5
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
            max_files: default_max_files(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_max_files() -> usize {
    5
}

impl Config {
    /// Apply the environment overrides the server honours.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides_from<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = get("HEADLESS") {
            let value = value.to_lowercase();
            self.browser.headless = value == "true" || value == "1";
        }
        if let Some(value) = get("SLOW_MO") {
            self.browser.slow_mo = parse_env("SLOW_MO", &value)?;
        }
        if let Some(value) = get("API_HOST") {
            self.server.host = value;
        }
        if let Some(value) = get("API_PORT") {
            self.server.port = parse_env("API_PORT", &value)?;
        }
        if let Some(value) = get("OPENAI_API_KEY") {
            if !value.is_empty() {
                self.llm.api_key = Some(value);
            }
        }
        Ok(())
    }

    /// Root data directory.
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("webpilot"),
        }
    }

    /// Root config directory.
    pub fn config_dir(&self) -> PathBuf {
        match &self.config_dir {
            Some(dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
            None => ConfigLoader::default_config_dir(),
        }
    }

    /// Where conversation memory lives.
    pub fn memory_dir(&self) -> PathBuf {
        match &self.memory.data_dir {
            Some(dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
            None => self.data_dir().join("memory"),
        }
    }

    /// Where the scheduler keeps `tasks.json`.
    pub fn scheduler_dir(&self) -> PathBuf {
        match &self.scheduler.config_dir {
            Some(dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
            None => self.config_dir().join("scheduler"),
        }
    }

    /// Where log files go.
    pub fn log_dir(&self) -> PathBuf {
        match &self.logging.dir {
            Some(dir) => PathBuf::from(ConfigLoader::expand_path(dir)),
            None => self.data_dir().join("logs"),
        }
    }

    /// Root of the per-browser profiles.
    pub fn profiles_dir(&self) -> PathBuf {
        self.config_dir().join("browsers")
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: name.to_string(),
        message: format!("cannot parse '{}'", value),
    })
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
