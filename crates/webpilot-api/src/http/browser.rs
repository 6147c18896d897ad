//! Level 1/2 handlers: run a command on a pooled driver, extract data.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use webpilot_agent::{ActionExecutor, LazyDriver};

use crate::error::ApiError;
use crate::http::{ApiResponse, check_browser, default_browser};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct InteractRequest {
    pub command: String,
    #[serde(default = "default_browser")]
    pub browser: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_slow_mo")]
    pub slow_mo: u64,
}

fn default_slow_mo() -> u64 {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractRequest {
    pub extraction_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub browser: Option<String>,
}

/// POST /interact
pub async fn interact(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InteractRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    check_browser(&request.browser, Some(state.config.browser.driver))?;
    let actions = state.parser.parse_with_llm(&request.command).await;
    if actions.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Could not understand command: {}",
            request.command
        )));
    }
    info!("Executing {} actions for: {}", actions.len(), request.command);

    let driver = state
        .drivers
        .get(&request.browser, request.headless, request.slow_mo)
        .await?;
    let executor = ActionExecutor::new(Arc::new(LazyDriver::ready(driver)), state.extractor.clone());
    let report = executor.execute(&actions).await;

    Ok(Json(
        ApiResponse::success("Command executed successfully")
            .with_data(json!({ "results": report.results })),
    ))
}

/// POST /extract
pub async fn extract(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    if let Some(browser) = &request.browser {
        check_browser(browser, None)?;
        debug!("Extract requested for browser {}", browser);
    }
    let output = state
        .extractor
        .extract(&request.extraction_type, &request.params)
        .await?;
    let outcome = serde_json::to_value(output.to_outcome())?;
    Ok(Json(ApiResponse::success("Data extracted successfully").with_data(outcome)))
}
