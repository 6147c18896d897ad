//! `webpilot setup`: prepare directories and report missing tools.

use std::path::{Path, PathBuf};

use webpilot_config::{Config, ConfigLoader};
use webpilot_driver_cdp::BrowserManager;
use webpilot_driver_native::find_tesseract;

/// What setup found and did.
#[derive(Debug, Default)]
pub(crate) struct SetupReport {
    pub created_dirs: Vec<PathBuf>,
    pub config_written: Option<PathBuf>,
    pub browser: Option<PathBuf>,
    pub tesseract: Option<PathBuf>,
}

impl SetupReport {
    pub fn missing(&self, browser_name: &str) -> Vec<String> {
        let mut missing = Vec::new();
        if self.browser.is_none() {
            missing.push(format!(
                "{} was not found. Install it or set [browser] executable in the config.",
                browser_name
            ));
        }
        if self.tesseract.is_none() {
            missing.push("tesseract was not found. OCR and the native driver need it.".to_string());
        }
        missing
    }
}

/// Create directories and the default config, then look for tools.
pub(crate) fn setup(config: &Config, config_path: &Path) -> Result<SetupReport, Box<dyn std::error::Error>> {
    let mut report = SetupReport::default();

    for dir in [
        config.config_dir(),
        config.data_dir(),
        config.log_dir(),
        config.memory_dir(),
        config.scheduler_dir(),
        config.profiles_dir(),
    ] {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            report.created_dirs.push(dir);
        }
    }

    if !config_path.exists() {
        ConfigLoader::save(config, config_path)?;
        report.config_written = Some(config_path.to_path_buf());
    }

    report.browser = match &config.browser.executable {
        Some(path) => Some(PathBuf::from(ConfigLoader::expand_path(path))).filter(|p| p.exists()),
        None => BrowserManager::find_browser(&config.browser.name),
    };
    report.tesseract = find_tesseract();
    Ok(report)
}

/// Print the report for a human.
pub(crate) fn print_report(report: &SetupReport, browser_name: &str) {
    for dir in &report.created_dirs {
        println!("Created {}", dir.display());
    }
    if let Some(path) = &report.config_written {
        println!("Wrote default config to {}", path.display());
    }
    if let Some(path) = &report.browser {
        println!("Found {}: {}", browser_name, path.display());
    }
    if let Some(path) = &report.tesseract {
        println!("Found tesseract: {}", path.display());
    }

    let missing = report.missing(browser_name);
    if missing.is_empty() {
        println!("Setup complete.");
    } else {
        for line in missing {
            println!("Missing: {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.data_dir = Some(dir.path().join("data").to_string_lossy().into_owned());
        config.config_dir = Some(dir.path().join("config").to_string_lossy().into_owned());
        config.browser.executable = Some(dir.path().join("no-such-browser").to_string_lossy().into_owned());
        config
    }

    #[test]
    fn test_setup_creates_dirs_and_config() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let path = config.config_dir().join("config.toml");

        let report = setup(&config, &path).unwrap();
        assert!(path.exists());
        assert_eq!(report.config_written.as_deref(), Some(path.as_path()));
        assert!(config.memory_dir().is_dir());
        assert!(config.scheduler_dir().is_dir());
        assert!(config.profiles_dir().is_dir());
        assert!(config.log_dir().is_dir());
        assert!(report.browser.is_none());

        let loaded = ConfigLoader::load(&path).unwrap();
        assert_eq!(loaded.browser.name, "chrome");
    }

    #[test]
    fn test_setup_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let path = config.config_dir().join("config.toml");
        std::fs::create_dir_all(config.config_dir()).unwrap();
        std::fs::write(&path, "[server]\nport = 9100\n").unwrap();

        setup(&config, &path).unwrap();
        let again = setup(&config, &path).unwrap();
        assert!(again.created_dirs.is_empty());
        assert!(again.config_written.is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[server]\nport = 9100\n");
    }

    #[test]
    fn test_missing_report() {
        let report = SetupReport::default();
        let missing = report.missing("chrome");
        assert_eq!(missing.len(), 2);
        assert!(missing[0].starts_with("chrome was not found"));

        let report = SetupReport {
            browser: Some(PathBuf::from("/usr/bin/chrome")),
            tesseract: Some(PathBuf::from("/usr/bin/tesseract")),
            ..Default::default()
        };
        assert!(report.missing("chrome").is_empty());
    }
}
