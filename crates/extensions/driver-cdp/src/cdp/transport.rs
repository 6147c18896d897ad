//! Shared WebSocket plumbing for the client and its page sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{CdpRequest, CdpResponse};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;
pub(crate) type WsSource = SplitStream<WsStream>;

/// Per-call timeout.
pub(crate) const CALL_TIMEOUT: Duration = Duration::from_secs(30);

type Reply = oneshot::Sender<Result<Value, CdpError>>;

/// Calls waiting for their response, keyed by request id.
#[derive(Default)]
pub(crate) struct PendingCalls {
    waiting: Mutex<HashMap<u64, Reply>>,
}

impl PendingCalls {
    pub(crate) fn register(&self, id: u64) -> oneshot::Receiver<Result<Value, CdpError>> {
        let (tx, rx) = oneshot::channel();
        self.waiting.lock().insert(id, tx);
        rx
    }

    pub(crate) fn forget(&self, id: u64) {
        self.waiting.lock().remove(&id);
    }

    /// Route a response to its caller. Returns false for events and
    /// responses nobody waits for.
    pub(crate) fn resolve(&self, response: CdpResponse) -> bool {
        let Some(id) = response.id else {
            return false;
        };
        let Some(reply) = self.waiting.lock().remove(&id) else {
            return false;
        };
        let result = match response.error {
            Some(error) => Err(CdpError::Protocol {
                code: error.code,
                message: error.message,
            }),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };
        let _ = reply.send(result);
        true
    }

    /// Drop every waiter; their receivers see the session as closed.
    pub(crate) fn clear(&self) {
        self.waiting.lock().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.waiting.lock().len()
    }
}

/// One browser WebSocket, shared by everything that talks over it.
pub(crate) struct Transport {
    sink: tokio::sync::Mutex<WsSink>,
    pending: PendingCalls,
    next_id: AtomicU64,
}

impl Transport {
    pub(crate) fn new(sink: WsSink) -> Self {
        Self {
            sink: tokio::sync::Mutex::new(sink),
            pending: PendingCalls::default(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Send a command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(str::to_string),
        };
        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let rx = self.pending.register(id);
        {
            let mut sink = self.sink.lock().await;
            if let Err(e) = sink.send(Message::Text(json.into())).await {
                self.pending.forget(id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.forget(id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    /// Read the socket until it closes, resolving pending calls.
    pub(crate) async fn receive_loop(self: Arc<Self>, mut source: WsSource) {
        while let Some(msg) = source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => {
                            if resp.id.is_none() {
                                if let Some(method) = &resp.method {
                                    trace!("CDP event {}", method);
                                }
                            } else {
                                self.pending.resolve(resp);
                            }
                        }
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("CDP socket closed");
                    break;
                }
                Err(e) => {
                    error!("CDP socket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
        self.pending.clear();
    }

    /// Close the socket politely.
    pub(crate) async fn close(&self) {
        let mut sink = self.sink.lock().await;
        let _ = sink.send(Message::Close(None)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> CdpResponse {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_result() {
        let pending = PendingCalls::default();
        let rx = pending.register(3);

        assert!(pending.resolve(response(r#"{"id": 3, "result": {"nodeId": 12}}"#)));
        let value = rx.await.unwrap().unwrap();
        assert_eq!(value["nodeId"], 12);
        assert_eq!(pending.len(), 0);
    }

    #[tokio::test]
    async fn test_resolve_error() {
        let pending = PendingCalls::default();
        let rx = pending.register(4);

        pending.resolve(response(
            r#"{"id": 4, "error": {"code": -32000, "message": "No node with given id"}}"#,
        ));
        match rx.await.unwrap() {
            Err(CdpError::Protocol { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "No node with given id");
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_result_is_null() {
        let pending = PendingCalls::default();
        let rx = pending.register(5);
        pending.resolve(response(r#"{"id": 5}"#));
        assert_eq!(rx.await.unwrap().unwrap(), Value::Null);
    }

    #[test]
    fn test_events_and_strangers_are_ignored() {
        let pending = PendingCalls::default();
        let _rx = pending.register(1);

        assert!(!pending.resolve(response(r#"{"method": "Page.frameNavigated", "params": {}}"#)));
        assert!(!pending.resolve(response(r#"{"id": 99, "result": {}}"#)));
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_closes_waiters() {
        let pending = PendingCalls::default();
        let rx = pending.register(1);
        pending.clear();
        assert!(rx.await.is_err());
    }
}
