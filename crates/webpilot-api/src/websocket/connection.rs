//! WebSocket connection management.

use dashmap::DashMap;
use tokio::sync::mpsc;

/// Open connections, grouped by user. Each connection is fed through an
/// mpsc channel of text frames.
pub struct WsConnectionManager {
    connections: DashMap<String, Vec<(String, mpsc::Sender<String>)>>,
}

impl WsConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn add(&self, user_id: &str, connection_id: &str, sender: mpsc::Sender<String>) {
        self.connections
            .entry(user_id.to_string())
            .or_default()
            .push((connection_id.to_string(), sender));
    }

    pub fn remove(&self, user_id: &str, connection_id: &str) {
        let now_empty = match self.connections.get_mut(user_id) {
            Some(mut entry) => {
                entry.retain(|(id, _)| id != connection_id);
                entry.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.connections.remove_if(user_id, |_, conns| conns.is_empty());
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_connected(&self, user_id: &str) -> bool {
        self.connections.contains_key(user_id)
    }

    /// Send a frame to every connection of `user_id`. Returns how many
    /// took it.
    pub async fn send_to(&self, user_id: &str, frame: &str) -> usize {
        let senders: Vec<mpsc::Sender<String>> = match self.connections.get(user_id) {
            Some(entry) => entry.iter().map(|(_, tx)| tx.clone()).collect(),
            None => return 0,
        };
        let mut delivered = 0;
        for sender in senders {
            if sender.send(frame.to_string()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub async fn broadcast(&self, frame: &str) {
        let senders: Vec<mpsc::Sender<String>> = self
            .connections
            .iter()
            .flat_map(|e| e.value().iter().map(|(_, tx)| tx.clone()).collect::<Vec<_>>())
            .collect();
        for sender in senders {
            let _ = sender.send(frame.to_string()).await;
        }
    }
}

impl Default for WsConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WsConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnectionManager")
            .field("connections", &self.connection_count())
            .finish()
    }
}
