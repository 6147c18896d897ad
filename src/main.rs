//! webpilot: natural-language browser automation.
//!
//! Entry point for the `run`, `serve` and `setup` commands.

mod cli;
mod cmd_run;
mod cmd_serve;
mod cmd_setup;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use webpilot_config::{Config, ConfigLoader, ConfigValidator};

use crate::cli::{Cli, Commands};

/// Console and daily-rotated file logging under `config.log_dir()`.
fn init_tracing(config: &Config, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("webpilot")
        .filename_suffix("log")
        .max_log_files(config.logging.max_files.max(1))
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// `setup` may be pointed at a config file it is about to create.
fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match (&cli.command, cli.config.as_deref()) {
        (Commands::Setup, Some(path)) if !path.exists() => None,
        (_, path) => path,
    };
    let mut config = ConfigLoader::load_or_default(path)?;
    config.apply_env_overrides()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config, cli.verbose)?;

    let validation = ConfigValidator::validate(&config)?;
    for warning in &validation.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if !validation.is_valid() {
        for err in &validation.errors {
            error!("Config {}: {}", err.path, err.message);
        }
        return Err("invalid configuration".into());
    }

    match cli.command {
        Commands::Run {
            command,
            headless,
            slow_mo,
            browser,
            driver,
        } => {
            let mut config = config;
            config.browser.headless |= headless;
            if let Some(slow_mo) = slow_mo {
                config.browser.slow_mo = slow_mo;
            }
            if let Some(browser) = browser {
                config.browser.name = browser.to_lowercase();
            }
            if let Some(driver) = driver {
                config.browser.driver = driver.into();
            }

            let report = cmd_run::run_command(config, &command).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !cmd_run::succeeded(&report) {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Serve { host, port } => cmd_serve::serve(config, host, port).await,
        Commands::Setup => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(|| config.config_dir().join("config.toml"));
            let report = cmd_setup::setup(&config, &path)?;
            info!("Setup finished in {}", config.config_dir().display());
            cmd_setup::print_report(&report, &config.browser.name);
            Ok(())
        }
    }
}
