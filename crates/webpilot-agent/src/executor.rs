//! Runs browser actions on the agent's driver.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use webpilot_extractor::DataExtractor;
use webpilot_protocols::{Action, ActionOutcome, ActionRecord, ExecutionReport};
use webpilot_scheduler::{SchedulerError, Task, TaskRunner};

use crate::driver::LazyDriver;
use crate::error::AgentError;

/// Executes actions on the lazily created driver. Extraction goes through
/// the [`DataExtractor`] with the current page as its source.
#[derive(Debug)]
pub struct ActionExecutor {
    driver: Arc<LazyDriver>,
    extractor: DataExtractor,
}

impl ActionExecutor {
    pub fn new(driver: Arc<LazyDriver>, extractor: DataExtractor) -> Self {
        Self { driver, extractor }
    }

    pub fn driver(&self) -> &Arc<LazyDriver> {
        &self.driver
    }

    pub fn extractor(&self) -> &DataExtractor {
        &self.extractor
    }

    /// Execute one action.
    ///
    /// `Err` means the driver could not be created or failed outright. A
    /// failed outcome means the action ran and did not succeed.
    pub async fn execute_action(&self, action: &Action) -> Result<ActionOutcome, AgentError> {
        match action {
            Action::Navigate { .. }
            | Action::Click { .. }
            | Action::Type { .. }
            | Action::Search { .. }
            | Action::Login { .. }
            | Action::Scroll { .. }
            | Action::Wait { .. }
            | Action::Press { .. } => {
                let driver = self.driver.get().await?;
                Ok(driver.execute_action(action).await?)
            }
            Action::Extract {
                extraction_type,
                selector,
                format,
                params,
            } => {
                self.extract(
                    extraction_type.as_deref(),
                    selector.as_deref(),
                    format.as_deref(),
                    params,
                )
                .await
            }
            Action::Error { message } => Ok(ActionOutcome::fail(message.clone())),
            other => Ok(ActionOutcome::unknown_action(other.kind())),
        }
    }

    /// Execute actions in order. Every action gets a record.
    pub async fn execute(&self, actions: &[Action]) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for action in actions {
            let record = match self.execute_action(action).await {
                Ok(outcome) => ActionRecord::completed(action.clone(), outcome),
                Err(e) => {
                    warn!("Action {} failed: {}", action.kind(), e);
                    ActionRecord::completed(action.clone(), ActionOutcome::fail(e.to_string()))
                }
            };
            report.push(record);
        }
        report
    }

    async fn extract(
        &self,
        extraction_type: Option<&str>,
        selector: Option<&str>,
        format: Option<&str>,
        params: &Map<String, Value>,
    ) -> Result<ActionOutcome, AgentError> {
        let driver = self.driver.get().await?;
        let kind = extraction_type.unwrap_or(if driver.name() == "native" { "ocr" } else { "html" });

        let mut params = params.clone();
        if let Some(selector) = selector {
            params
                .entry("selector")
                .or_insert_with(|| Value::String(selector.to_string()));
        }
        if let Some(format) = format {
            params
                .entry("format")
                .or_insert_with(|| Value::String(format.to_string()));
        }

        let page = if kind != "ocr" && !params.contains_key("html") && !params.contains_key("url") {
            match driver.page_content().await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Could not read page content: {}", e);
                    None
                }
            }
        } else {
            None
        };

        debug!("Extracting {} via {} driver", kind, driver.name());
        match self.extractor.extract_with_page(kind, &params, page.as_deref()).await {
            Ok(output) => Ok(output.to_outcome()),
            Err(e) => Ok(ActionOutcome::fail(e.to_string())),
        }
    }
}

#[async_trait]
impl TaskRunner for ActionExecutor {
    async fn run(&self, task: &Task) -> Result<ExecutionReport, SchedulerError> {
        debug!("Running {} actions for task {}", task.actions.len(), task.task_id);
        Ok(self.execute(&task.actions).await)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
