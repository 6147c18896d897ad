//! `webpilot run`: one command on a fresh driver.

use std::sync::Arc;

use tracing::{info, warn};

use webpilot_agent::{ActionExecutor, ConfigDriverFactory, DriverFactory, LazyDriver};
use webpilot_config::{Config, ProfileStore};
use webpilot_driver_native::OcrController;
use webpilot_extractor::DataExtractor;
use webpilot_parser::CommandParser;
use webpilot_protocols::ExecutionReport;

/// Parse and execute `command`. Returns the report; the caller decides the
/// exit code.
pub(crate) async fn run_command(
    config: Config,
    command: &str,
) -> Result<ExecutionReport, Box<dyn std::error::Error>> {
    let parser = CommandParser::new(&config.llm)?;
    let actions = parser.parse_with_llm(command).await;
    if actions.is_empty() {
        warn!("No actions parsed from: {}", command);
        return Ok(ExecutionReport::default());
    }
    info!("Parsed {} actions from: {}", actions.len(), command);

    let profiles = Arc::new(ProfileStore::new(config.profiles_dir()));
    let driver = ConfigDriverFactory::new(config, profiles).create().await?;
    let extractor = DataExtractor::new()?.with_ocr(Arc::new(OcrController::default()));
    let lazy = Arc::new(LazyDriver::ready(driver));
    let executor = ActionExecutor::new(lazy.clone(), extractor);

    let report = executor.execute(&actions).await;
    info!("Result: {}", serde_json::to_string(&report)?);

    if let Err(e) = lazy.close().await {
        warn!("Failed to close driver: {}", e);
    }
    Ok(report)
}

/// An empty report means nothing was understood, which counts as failure.
pub(crate) fn succeeded(report: &ExecutionReport) -> bool {
    !report.results.is_empty() && report.all_succeeded()
}
