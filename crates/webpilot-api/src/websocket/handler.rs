//! WebSocket handler.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::state::AppState;

/// `GET /ws/{user_id}`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

async fn handle_socket(socket: WebSocket, user_id: String, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4().to_string();
    info!("WebSocket connected: {} ({})", user_id, connection_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(100);
    state.connections.add(&user_id, &connection_id, tx.clone());

    let sender_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                debug!("Received from {}: {}", user_id, text.as_str());
                let reply = process_frame(&state, &user_id, text.as_str()).await;
                if tx.send(reply.to_string()).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: {} ({})", user_id, connection_id);
                break;
            }
            // Pongs are sent by the protocol layer.
            Ok(Message::Ping(_)) => debug!("Ping from {}", user_id),
            Err(e) => {
                error!("WebSocket error for {}: {}", user_id, e);
                break;
            }
            _ => {}
        }
    }

    state.connections.remove(&user_id, &connection_id);
    drop(tx);
    sender_task.abort();
    info!("WebSocket disconnected: {} ({})", user_id, connection_id);
}

/// Answer one text frame: the dialog response, or `{"error": ...}`.
pub async fn process_frame(state: &AppState, user_id: &str, text: &str) -> Value {
    let frame: Value = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => return json!({ "error": format!("Invalid JSON: {}", e) }),
    };
    let Some(message) = frame.get("message").and_then(Value::as_str) else {
        return json!({ "error": "Missing 'message' field" });
    };
    let response = state.agent.process_message(user_id, message).await;
    serde_json::to_value(&response).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}
