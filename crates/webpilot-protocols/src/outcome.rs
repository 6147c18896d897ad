//! Action results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::Action;

/// Result of executing one action.
///
/// Serializes flat: `{"success": true, "message": "...", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    /// Extra fields such as `data`, `url`, `location` or `task_id`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActionOutcome {
    /// A successful outcome.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// A failed outcome.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Outcome for an action type the executor does not handle.
    pub fn unknown_action(kind: &str) -> Self {
        Self::fail(format!("Unknown action type: {}", kind))
    }

    /// Attach an extra field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Get an extra field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// One action paired with what happened when it ran.
///
/// Exactly one of `result` and `error` is set: `error` means the action
/// could not be dispatched at all (no handler, handler crashed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ActionOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionRecord {
    pub fn completed(action: Action, outcome: ActionOutcome) -> Self {
        Self {
            action,
            result: Some(outcome),
            error: None,
        }
    }

    pub fn errored(action: Action, error: impl Into<String>) -> Self {
        Self {
            action,
            result: None,
            error: Some(error.into()),
        }
    }

    /// True when the action ran and reported success.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.result.as_ref().is_some_and(|r| r.success)
    }
}

/// Result of a batch of actions, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub results: Vec<ActionRecord>,
}

impl ExecutionReport {
    pub fn push(&mut self, record: ActionRecord) {
        self.results.push(record);
    }

    /// True when every action succeeded. An empty report counts as success.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(ActionRecord::is_success)
    }
}
