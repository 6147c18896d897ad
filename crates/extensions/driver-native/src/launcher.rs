//! Browser process launch for the native driver.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use webpilot_config::{BrowserProfile, Config};

/// What to launch: the configured browser and its extra arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub browser: String,
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(browser: impl Into<String>) -> Self {
        Self {
            browser: browser.into().to_lowercase(),
            executable: None,
            args: Vec::new(),
        }
    }

    /// Spec for the configured browser with its profile applied.
    pub fn from_config(config: &Config, profile: &BrowserProfile) -> Self {
        let browser = config.browser.name.to_lowercase();
        let mut args = Vec::new();
        if is_chromium(&browser) {
            args.push("--start-maximized".to_string());
        }
        args.extend(profile.launch_args(&browser));
        Self {
            executable: config.browser.executable.as_ref().map(PathBuf::from),
            browser,
            args,
        }
    }

    /// The command for this platform, or `None` when the browser cannot be
    /// found.
    pub fn command(&self) -> Option<BrowserCommand> {
        let path = std::env::var_os("PATH").unwrap_or_default();
        self.command_in(&path)
    }

    pub(crate) fn command_in(&self, path_var: &OsStr) -> Option<BrowserCommand> {
        if let Some(executable) = &self.executable {
            return executable.is_file().then(|| BrowserCommand {
                program: executable.clone(),
                args: self.args.clone(),
            });
        }
        platform_command(&self.browser, &self.args, path_var)
    }
}

fn is_chromium(browser: &str) -> bool {
    matches!(browser, "chrome" | "chromium" | "edge")
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[cfg(target_os = "macos")]
fn platform_command(browser: &str, args: &[String], _path_var: &OsStr) -> Option<BrowserCommand> {
    let app = match browser {
        "chrome" => "Google Chrome",
        "chromium" => "Chromium",
        "firefox" => "Firefox",
        "safari" => "Safari",
        "edge" => "Microsoft Edge",
        _ => return None,
    };
    let mut all = vec!["-a".to_string(), app.to_string()];
    if !args.is_empty() {
        all.push("--args".to_string());
        all.extend(args.iter().cloned());
    }
    Some(BrowserCommand {
        program: PathBuf::from("open"),
        args: all,
    })
}

#[cfg(target_os = "windows")]
fn platform_command(browser: &str, args: &[String], _path_var: &OsStr) -> Option<BrowserCommand> {
    let exe = match browser {
        "chrome" => "chrome",
        "firefox" => "firefox",
        "edge" => "msedge",
        _ => return None,
    };
    let mut all = vec!["/C".to_string(), "start".to_string(), String::new(), exe.to_string()];
    all.extend(args.iter().cloned());
    Some(BrowserCommand {
        program: PathBuf::from("cmd"),
        args: all,
    })
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_command(browser: &str, args: &[String], path_var: &OsStr) -> Option<BrowserCommand> {
    let names: &[&str] = match browser {
        "chrome" => &["google-chrome", "google-chrome-stable", "chrome", "chromium", "chromium-browser"],
        "chromium" => &["chromium", "chromium-browser"],
        "firefox" => &["firefox"],
        "edge" => &["microsoft-edge", "microsoft-edge-stable"],
        _ => return None,
    };
    names
        .iter()
        .find_map(|name| find_in(name, path_var))
        .map(|program| BrowserCommand {
            program,
            args: args.to_vec(),
        })
}

fn executable_names(name: &str) -> Vec<String> {
    if cfg!(windows) && Path::new(name).extension().is_none() {
        vec![format!("{}.exe", name), name.to_string()]
    } else {
        vec![name.to_string()]
    }
}

pub(crate) fn find_in(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    let names = executable_names(name);
    std::env::split_paths(path_var).find_map(|dir| {
        names
            .iter()
            .map(|n| dir.join(n))
            .find(|candidate| candidate.is_file())
    })
}

/// Look `name` up on `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    find_in(name, &path)
}

/// Locate the tesseract binary on `PATH` or in its usual install places.
pub fn find_tesseract() -> Option<PathBuf> {
    if let Some(found) = find_executable("tesseract") {
        return Some(found);
    }
    let known: &[&str] = if cfg!(target_os = "windows") {
        &[r"C:\Program Files\Tesseract-OCR\tesseract.exe"]
    } else if cfg!(target_os = "macos") {
        &["/opt/homebrew/bin/tesseract", "/usr/local/bin/tesseract"]
    } else {
        &["/usr/bin/tesseract", "/usr/local/bin/tesseract"]
    };
    known.iter().map(PathBuf::from).find(|p| p.is_file())
}
