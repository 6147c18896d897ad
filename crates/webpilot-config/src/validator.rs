//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, DriverKind};

/// Browsers the launchers know how to start.
pub const KNOWN_BROWSERS: &[&str] = &["chrome", "chromium", "edge", "brave", "firefox"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_browser(config, &mut result);
        Self::validate_llm(config, &mut result);
        Self::validate_scheduler(config, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    /// The reason `name` cannot be used, if any. With a `driver`, the
    /// pairing is checked too.
    pub fn check_browser(name: &str, driver: Option<DriverKind>) -> Option<ValidationError> {
        let lower = name.to_lowercase();
        if !KNOWN_BROWSERS.contains(&lower.as_str()) {
            return Some(ValidationError::new(
                "browser.name",
                format!("Unknown browser '{}', valid values: {:?}", name, KNOWN_BROWSERS),
            ));
        }
        if driver == Some(DriverKind::Cdp) && lower == "firefox" {
            return Some(ValidationError::new(
                "browser.driver",
                "The cdp driver needs a Chromium-based browser",
            ));
        }
        None
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if let Some(error) = Self::check_browser(&config.browser.name, Some(config.browser.driver)) {
            result.add_error(error);
        }

        if config.browser.slow_mo > 5000 {
            result.add_warning(ValidationWarning::new(
                "browser.slow_mo",
                "slow_mo is very high (>5000 ms), every action will be slow",
            ));
        }

        if config.browser.driver == DriverKind::Native && config.browser.headless {
            result.add_warning(ValidationWarning::new(
                "browser.headless",
                "headless has no effect with the native driver",
            ));
        }
    }

    fn validate_llm(config: &Config, result: &mut ValidationResult) {
        let llm = &config.llm;
        if llm.enabled && llm.api_key.as_deref().is_none_or(str::is_empty) {
            result.add_error(ValidationError::new(
                "llm.api_key",
                "LLM parsing is enabled but no API key is set (use OPENAI_API_KEY)",
            ));
        }

        if !llm.api_url.starts_with("http://") && !llm.api_url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "llm.api_url",
                "api_url must start with http:// or https://",
            ));
        }

        if !(0.0..=2.0).contains(&llm.temperature) {
            result.add_warning(ValidationWarning::new(
                "llm.temperature",
                "temperature is outside 0.0-2.0",
            ));
        }
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        if config.scheduler.check_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "scheduler.check_interval_secs",
                "check_interval_secs must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
