//! CLI definitions for webpilot.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use webpilot_config::DriverKind;

/// webpilot CLI.
#[derive(Parser)]
#[command(name = "webpilot")]
#[command(about = "Natural-language browser automation")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "WEBPILOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Parse a command and run it in a browser
    Run {
        /// The instruction, e.g. "go to example.com and click login"
        command: String,

        /// Run the browser without a window
        #[arg(long)]
        headless: bool,

        /// Delay between input events in milliseconds
        #[arg(long)]
        slow_mo: Option<u64>,

        /// Browser to drive
        #[arg(long)]
        browser: Option<String>,

        /// Driver backend
        #[arg(long, value_enum)]
        driver: Option<DriverArg>,
    },

    /// Start the HTTP/WebSocket API server
    Serve {
        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create directories and a default config, and check for a browser and tesseract
    Setup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DriverArg {
    Cdp,
    Native,
}

impl From<DriverArg> for DriverKind {
    fn from(arg: DriverArg) -> Self {
        match arg {
            DriverArg::Cdp => DriverKind::Cdp,
            DriverArg::Native => DriverKind::Native,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["webpilot", "run", "go to example.com"]).unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Run {
                command,
                headless,
                slow_mo,
                browser,
                driver,
            } => {
                assert_eq!(command, "go to example.com");
                assert!(!headless);
                assert_eq!(slow_mo, None);
                assert_eq!(browser, None);
                assert_eq!(driver, None);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "webpilot",
            "run",
            "click login",
            "--headless",
            "--slow-mo",
            "0",
            "--browser",
            "firefox",
            "--driver",
            "native",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                headless,
                slow_mo,
                browser,
                driver,
                ..
            } => {
                assert!(headless);
                assert_eq!(slow_mo, Some(0));
                assert_eq!(browser.as_deref(), Some("firefox"));
                assert_eq!(driver.map(DriverKind::from), Some(DriverKind::Native));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_serve_and_setup() {
        let cli = Cli::try_parse_from(["webpilot", "--config", "/tmp/w.toml", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/w.toml")));
        assert!(matches!(cli.command, Commands::Serve { host: None, port: Some(9000) }));

        let cli = Cli::try_parse_from(["webpilot", "setup"]).unwrap();
        assert!(matches!(cli.command, Commands::Setup));
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["webpilot"]).is_err());
    }
}
