//! DOM queries.

use serde_json::json;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::{BoxModel, DomNode};

use super::core::PageSession;
use super::js_string;

impl PageSession {
    /// Document root. Only the root is fetched; queries walk the live DOM.
    pub async fn document(&self) -> Result<DomNode, CdpError> {
        let result = self
            .call("DOM.getDocument", Some(json!({ "depth": 0 })))
            .await?;
        Ok(serde_json::from_value(result["root"].clone())?)
    }

    pub async fn query_selector(&self, selector: &str) -> Result<Option<i64>, CdpError> {
        let doc = self.document().await?;
        let result = self
            .call(
                "DOM.querySelector",
                Some(json!({ "nodeId": doc.node_id, "selector": selector })),
            )
            .await;

        match result {
            Ok(value) => Ok(value["nodeId"].as_i64().filter(|id| *id != 0)),
            // Syntax the browser rejects counts as no match.
            Err(CdpError::Protocol { code: -32000, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Box model, or `None` when the node is not rendered.
    pub async fn box_model(&self, node_id: i64) -> Result<Option<BoxModel>, CdpError> {
        match self
            .call("DOM.getBoxModel", Some(json!({ "nodeId": node_id })))
            .await
        {
            Ok(r) => Ok(Some(serde_json::from_value(r["model"].clone())?)),
            Err(CdpError::Protocol { code: -32000, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn focus(&self, node_id: i64) -> Result<(), CdpError> {
        self.call("DOM.focus", Some(json!({ "nodeId": node_id })))
            .await?;
        Ok(())
    }

    /// `scrollIntoView` on the first match of `selector`.
    pub async fn scroll_into_view(&self, selector: &str) -> Result<bool, CdpError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); \
             if (!el) return false; el.scrollIntoView({{block: 'center'}}); return true; }})()",
            js_string(selector)
        );
        self.evaluate_bool(&script).await
    }

    /// Focus the first match of `selector` and empty it.
    pub async fn clear_input(&self, selector: &str) -> Result<bool, CdpError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return false; el.focus(); \
             if ('value' in el) {{ el.value = ''; el.dispatchEvent(new Event('input', {{bubbles: true}})); }} \
             else if (el.isContentEditable) {{ el.textContent = ''; }} return true; }})()",
            js_string(selector)
        );
        self.evaluate_bool(&script).await
    }
}
