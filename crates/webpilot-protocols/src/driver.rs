//! Browser driver protocol.

use async_trait::async_trait;

use crate::action::Action;
use crate::error::DriverError;
use crate::outcome::{ActionOutcome, ActionRecord, ExecutionReport};

/// Executes actions against a browser.
///
/// Implementations: CDP (a Chromium over the DevTools protocol) and native
/// (OS-level mouse and keyboard with OCR-based element location).
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Short name of the driver, e.g. `"cdp"`.
    fn name(&self) -> &str;

    /// Execute a single action.
    ///
    /// Actions the driver does not handle return a failed outcome with
    /// `"Unknown action type: <type>"`.
    async fn execute_action(&self, action: &Action) -> Result<ActionOutcome, DriverError>;

    /// Execute actions in order. Never stops early: every action gets a
    /// record, and a driver error becomes a failed outcome.
    async fn execute(&self, actions: &[Action]) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for action in actions {
            let outcome = match self.execute_action(action).await {
                Ok(outcome) => outcome,
                Err(e) => ActionOutcome::fail(e.to_string()),
            };
            report.push(ActionRecord::completed(action.clone(), outcome));
        }
        report
    }

    /// HTML of the current page, when the driver can see the DOM.
    async fn page_content(&self) -> Result<Option<String>, DriverError> {
        Ok(None)
    }

    /// Release the browser. Idempotent.
    async fn close(&self) -> Result<(), DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedDriver {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BrowserDriver for ScriptedDriver {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn execute_action(&self, action: &Action) -> Result<ActionOutcome, DriverError> {
            self.seen.lock().unwrap().push(action.kind().to_string());
            match action {
                Action::Navigate { url } => Ok(ActionOutcome::ok(format!("Navigated to {}", url))),
                Action::Click { element } if element == "broken" => {
                    Err(DriverError::Other("Element not found: broken".to_string()))
                }
                Action::Click { element } => Ok(ActionOutcome::ok(format!("Clicked on {}", element))),
                other => Ok(ActionOutcome::unknown_action(other.kind())),
            }
        }

        async fn close(&self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_execute_runs_every_action() {
        let driver = ScriptedDriver {
            seen: Mutex::new(Vec::new()),
        };
        let actions = vec![
            Action::navigate("https://a.com"),
            Action::click("broken"),
            Action::click("ok"),
            Action::Unknown {
                kind: "teleport".to_string(),
            },
        ];

        let report = driver.execute(&actions).await;

        assert_eq!(report.results.len(), 4);
        assert_eq!(
            *driver.seen.lock().unwrap(),
            vec!["navigate", "click", "click", "teleport"]
        );

        let second = report.results[1].result.as_ref().unwrap();
        assert!(!second.success);
        assert_eq!(second.message, "Element not found: broken");

        let fourth = report.results[3].result.as_ref().unwrap();
        assert_eq!(fourth.message, "Unknown action type: teleport");
        assert!(!report.all_succeeded());
    }

    #[tokio::test]
    async fn test_default_page_content_is_none() {
        let driver = ScriptedDriver {
            seen: Mutex::new(Vec::new()),
        };
        assert!(driver.page_content().await.unwrap().is_none());
        assert_eq!(driver.name(), "scripted");
    }
}
