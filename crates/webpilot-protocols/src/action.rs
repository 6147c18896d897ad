//! Browser-automation actions.
//!
//! An [`Action`] is the unit the parser produces and the drivers consume.
//! On the wire it is a JSON object tagged by `"type"`:
//!
//! ```json
//! {"type": "type", "text": "hello world", "element": "search box"}
//! ```
//!
//! Objects whose `type` is not part of the vocabulary deserialize into
//! [`Action::Unknown`] so a batch can still be executed and reported on.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single browser-automation primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Load a URL.
    Navigate { url: String },

    /// Click an element described in natural language or by CSS selector.
    Click { element: String },

    /// Type text into an input.
    Type { text: String, element: String },

    /// Run a query on a search site.
    Search { query: String, site: String },

    /// Fill and submit a login form.
    Login {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        site: Option<String>,
        username: String,
        password: String,
    },

    /// Scroll to an element or in a direction.
    Scroll {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        direction: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<u32>,
    },

    /// Wait for an element or for a number of seconds.
    Wait {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seconds: Option<f64>,
    },

    /// Press a key, optionally on a focused element.
    Press {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<String>,
    },

    /// Extract data from the current page or screen.
    Extract {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extraction_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        params: Map<String, Value>,
    },

    /// Schedule a batch of actions for later.
    Schedule(ScheduleSpec),

    /// Store a value in the user's memory.
    Remember {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        #[serde(default)]
        value: Value,
    },

    /// Read a value from the user's memory.
    Recall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },

    /// Remove a value from the user's memory.
    Forget {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },

    /// Parsing failed; carries the reason.
    Error { message: String },

    /// An action type outside the vocabulary.
    #[serde(skip)]
    Unknown { kind: String },
}

/// Parameters of a `schedule` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `interval`, `cron` or `once`.
    #[serde(default = "default_schedule_type")]
    pub schedule_type: String,
    /// Seconds between runs for `interval` schedules.
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    /// ISO-8601 start time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// ISO-8601 end time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runs: Option<u32>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn default_schedule_type() -> String {
    "interval".to_string()
}

fn default_interval() -> u64 {
    3600
}

impl Default for ScheduleSpec {
    fn default() -> Self {
        Self {
            task_id: None,
            name: None,
            schedule_type: default_schedule_type(),
            interval: default_interval(),
            cron: None,
            start_time: None,
            end_time: None,
            max_runs: None,
            actions: Vec::new(),
        }
    }
}

impl Action {
    /// Every `type` string the vocabulary understands.
    pub const KINDS: &'static [&'static str] = &[
        "navigate", "click", "type", "search", "login", "scroll", "wait", "press", "extract",
        "schedule", "remember", "recall", "forget", "error",
    ];

    /// The `type` string of this action.
    pub fn kind(&self) -> &str {
        match self {
            Action::Navigate { .. } => "navigate",
            Action::Click { .. } => "click",
            Action::Type { .. } => "type",
            Action::Search { .. } => "search",
            Action::Login { .. } => "login",
            Action::Scroll { .. } => "scroll",
            Action::Wait { .. } => "wait",
            Action::Press { .. } => "press",
            Action::Extract { .. } => "extract",
            Action::Schedule(_) => "schedule",
            Action::Remember { .. } => "remember",
            Action::Recall { .. } => "recall",
            Action::Forget { .. } => "forget",
            Action::Error { .. } => "error",
            Action::Unknown { kind } => kind,
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Action::Navigate { url: url.into() }
    }

    pub fn click(element: impl Into<String>) -> Self {
        Action::Click {
            element: element.into(),
        }
    }

    pub fn type_text(text: impl Into<String>, element: impl Into<String>) -> Self {
        Action::Type {
            text: text.into(),
            element: element.into(),
        }
    }

    pub fn search(query: impl Into<String>, site: impl Into<String>) -> Self {
        Action::Search {
            query: query.into(),
            site: site.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Action::Error {
            message: message.into(),
        }
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Action::Unknown { kind } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("type", kind)?;
                map.end()
            }
            _ => Action::serialize(self, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value.get("type").and_then(Value::as_str) {
            Some(kind) if !Action::KINDS.contains(&kind) => Ok(Action::Unknown {
                kind: kind.to_string(),
            }),
            _ => Action::deserialize(value).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
