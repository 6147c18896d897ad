//! HTTP routes and handlers.

pub mod agent;
pub mod browser;
pub mod monitoring;
pub mod profile;

mod routes;

pub use routes::create_router;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use webpilot_config::{ConfigValidator, DriverKind};

use crate::error::ApiError;

/// The `{status, message, data?, error?}` envelope of the Level 1/2
/// endpoints and of Level 3 acknowledgements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Query string carrying the target browser, `chrome` when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserQuery {
    #[serde(default = "default_browser")]
    pub browser: String,
}

pub(crate) fn default_browser() -> String {
    "chrome".to_string()
}

/// Rejects unknown browser names, and with a `driver`, pairings it cannot run.
pub(crate) fn check_browser(name: &str, driver: Option<DriverKind>) -> Result<(), ApiError> {
    match ConfigValidator::check_browser(name, driver) {
        Some(error) => Err(ApiError::BadRequest(error.message)),
        None => Ok(()),
    }
}
