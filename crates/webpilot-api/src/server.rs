//! API server.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::http::create_router;
use crate::state::AppState;

/// Serves the API until shutdown, then closes pooled drivers and stops the
/// agent.
pub struct ApiServer {
    host: String,
    port: u16,
    state: Arc<AppState>,
}

impl ApiServer {
    /// A server on the address in `[server]`.
    pub fn new(state: Arc<AppState>) -> Self {
        let host = state.config.server.host.clone();
        let port = state.config.server.port;
        Self { host, port, state }
    }

    pub fn with_addr(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), ApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ApiError::Bind { addr: addr.clone(), source })?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), ApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(local) = listener.local_addr() {
            info!("API server listening on {}", local);
        }
        let app = create_router(self.state.clone());
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ApiError::Serve);

        info!("API server shutting down");
        self.state.drivers.close_all().await;
        if let Err(e) = self.state.agent.stop().await {
            warn!("Failed to stop agent: {}", e);
        }
        served
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubDriver, test_state};
    use futures::{SinkExt, StreamExt};
    use serde_json::Value;
    use tempfile::TempDir;
    use tokio::sync::oneshot;
    use tokio_tungstenite::{connect_async, tungstenite::Message};

    #[tokio::test]
    async fn test_addr_from_config() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir, StubDriver::new()).await;
        let server = ApiServer::new(state);
        assert_eq!(server.addr(), "0.0.0.0:8000");
        assert_eq!(server.with_addr("127.0.0.1", 9000).addr(), "127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_bind_error() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir, StubDriver::new()).await;
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let server = ApiServer::new(state).with_addr("127.0.0.1", port);
        let err = server.run(async {}).await.unwrap_err();
        assert!(matches!(err, ApiError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_websocket_dialog_and_shutdown() {
        let dir = TempDir::new().unwrap();
        let stub = StubDriver::new();
        let state = test_state(&dir, stub.clone()).await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = ApiServer::new(state.clone());
        let serving = tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = stop_rx.await;
                })
                .await
        });

        let (mut ws, _) = connect_async(format!("ws://{}/ws/alice", addr)).await.unwrap();

        ws.send(Message::Text(r#"{"message": "go to example.com"}"#.into()))
            .await
            .unwrap();
        let reply = loop {
            match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => break serde_json::from_str::<Value>(text.as_str()).unwrap(),
                _ => continue,
            }
        };
        assert_eq!(reply["user_id"], "alice");
        assert_eq!(reply["actions"][0]["type"], "navigate");
        assert!(state.connections.is_connected("alice"));

        ws.send(Message::Text("not json".into())).await.unwrap();
        let reply = loop {
            match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => break serde_json::from_str::<Value>(text.as_str()).unwrap(),
                _ => continue,
            }
        };
        assert!(reply["error"].as_str().unwrap().starts_with("Invalid JSON"));

        ws.close(None).await.unwrap();
        drop(ws);

        stop_tx.send(()).unwrap();
        serving.await.unwrap().unwrap();
        assert!(!state.agent.is_running());
        assert_eq!(stub.actions().len(), 1);
    }
}
