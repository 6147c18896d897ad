//! Browser-level CDP connection.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::{Value, json};
use tracing::debug;

use super::error::CdpError;
use super::protocol::{BrowserVersion, PageInfo};
use super::session::PageSession;
use super::transport::Transport;

/// Read `/json/version` from a debugging endpoint.
pub async fn fetch_version(endpoint: &str) -> Result<BrowserVersion, CdpError> {
    let endpoint = endpoint.trim_end_matches('/');
    let version_url = format!("{}/json/version", endpoint);
    debug!("Fetching browser version from {}", version_url);

    reqwest::get(&version_url)
        .await
        .map_err(|e| CdpError::BrowserNotAvailable(format!("{}: {}", endpoint, e)))?
        .json()
        .await
        .map_err(|e| CdpError::BrowserNotAvailable(format!("{}: {}", endpoint, e)))
}

/// Connection to a browser's debugging WebSocket.
pub struct CdpClient {
    http_endpoint: String,
    browser: String,
    transport: Arc<Transport>,
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the browser behind `endpoint`, e.g. `http://localhost:9222`.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        let version = fetch_version(&http_endpoint).await?;
        url::Url::parse(&version.web_socket_debugger_url)?;

        let (ws_stream, _) = tokio_tungstenite::connect_async(&version.web_socket_debugger_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;
        let (sink, source) = ws_stream.split();

        let transport = Arc::new(Transport::new(sink));
        let recv_task = tokio::spawn(transport.clone().receive_loop(source));

        debug!("CDP client connected to {} ({})", version.web_socket_debugger_url, version.browser);

        Ok(Self {
            http_endpoint,
            browser: version.browser,
            transport,
            recv_task,
        })
    }

    /// Product string reported by the browser, e.g. `Chrome/126.0.0.0`.
    pub fn browser(&self) -> &str {
        &self.browser
    }

    /// Browser-level command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.call(method, params, None).await
    }

    /// Open a tab and attach to it.
    pub async fn new_page(&self, url: Option<&str>) -> Result<PageSession, CdpError> {
        let create_url = match url {
            Some(u) => format!("{}/json/new?{}", self.http_endpoint, u),
            None => format!("{}/json/new", self.http_endpoint),
        };

        // Chrome only accepts PUT here.
        let page: PageInfo = reqwest::Client::new()
            .put(&create_url)
            .send()
            .await?
            .json()
            .await?;
        debug!("Created page {} at {}", page.id, page.url);

        self.attach_page(&page.id).await
    }

    /// Attach to an existing target with a flattened session.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({"targetId": target_id, "flatten": true})),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let session = PageSession::new(target_id.to_string(), session_id, self.transport.clone());
        session.enable_domains().await?;
        Ok(session)
    }

    pub async fn close_page(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.closeTarget", Some(json!({"targetId": target_id})))
            .await?;
        Ok(())
    }

    /// Close the socket. The browser process keeps running.
    pub async fn disconnect(&self) {
        self.transport.close().await;
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}
