//! Session struct and command dispatch.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::CookieParam;
use crate::cdp::transport::Transport;

/// A flattened session attached to one page target.
pub struct PageSession {
    pub(super) target_id: String,
    pub(super) session_id: String,
    pub(super) transport: Arc<Transport>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, transport: Arc<Transport>) -> Self {
        Self {
            target_id,
            session_id,
            transport,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a command scoped to this page.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        for domain in ["Page", "DOM", "Runtime", "Network"] {
            self.call(&format!("{}.enable", domain), None).await?;
        }
        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Full HTML of the current document.
    pub async fn content(&self) -> Result<String, CdpError> {
        let result = self.evaluate("document.documentElement.outerHTML").await?;
        Ok(result.as_str().unwrap_or_default().to_string())
    }

    /// Install cookies into the browser context.
    pub async fn set_cookies(&self, cookies: &[CookieParam]) -> Result<(), CdpError> {
        if cookies.is_empty() {
            return Ok(());
        }
        self.call("Network.setCookies", Some(json!({ "cookies": cookies })))
            .await?;
        debug!("Installed {} cookie(s)", cookies.len());
        Ok(())
    }
}
