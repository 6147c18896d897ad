//! Memory records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value memory for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub memory_id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Memory {
    pub fn new(memory_id: impl Into<String>) -> Self {
        Self::with_data(memory_id, Map::new())
    }

    pub fn with_data(memory_id: impl Into<String>, data: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            memory_id: memory_id.into(),
            data,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
        self.touch();
    }

    /// Remove `key`. Returns the old value.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        let old = self.data.remove(key);
        if old.is_some() {
            self.touch();
        }
        old
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `user`, `assistant` or `system`.
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: Utc::now(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Ordered message history for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMemory {
    pub memory_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationMemory {
    pub fn new(memory_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            memory_id: memory_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Messages from `role` (all roles when `None`), keeping only the last
    /// `limit` when given.
    pub fn messages(&self, limit: Option<usize>, role: Option<&str>) -> Vec<ChatMessage> {
        let filtered: Vec<&ChatMessage> = self
            .messages
            .iter()
            .filter(|m| role.is_none_or(|r| m.role == r))
            .collect();
        let skip = match limit {
            Some(limit) => filtered.len().saturating_sub(limit),
            None => 0,
        };
        filtered.into_iter().skip(skip).cloned().collect()
    }

    pub fn last_message(&self, role: Option<&str>) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| role.is_none_or(|r| m.role == r))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.updated_at = Utc::now();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conversation() -> ConversationMemory {
        let mut conv = ConversationMemory::new("alice");
        conv.add_message(ChatMessage::new("user", "hi"));
        conv.add_message(ChatMessage::new("assistant", "hello"));
        conv.add_message(ChatMessage::new("user", "open github"));
        conv.add_message(ChatMessage::new("assistant", "done"));
        conv
    }

    #[test]
    fn test_memory_set_get_delete() {
        let mut memory = Memory::new("alice");
        let created = memory.updated_at;

        memory.set("city", json!("Paris"));
        assert_eq!(memory.get("city"), Some(&json!("Paris")));
        assert!(memory.updated_at >= created);

        assert_eq!(memory.delete("city"), Some(json!("Paris")));
        assert_eq!(memory.delete("city"), None);
        assert!(memory.get("city").is_none());
    }

    #[test]
    fn test_memory_clear() {
        let mut data = Map::new();
        data.insert("a".to_string(), json!(1));
        let mut memory = Memory::with_data("bob", data);
        memory.clear();
        assert!(memory.data.is_empty());
    }

    #[test]
    fn test_messages_filter_then_limit() {
        let conv = conversation();
        assert_eq!(conv.messages(None, None).len(), 4);

        let last_two = conv.messages(Some(2), None);
        assert_eq!(last_two[0].content, "open github");
        assert_eq!(last_two[1].content, "done");

        let users = conv.messages(Some(1), Some("user"));
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].content, "open github");

        assert_eq!(conv.messages(Some(10), Some("system")).len(), 0);
    }

    #[test]
    fn test_last_message() {
        let conv = conversation();
        assert_eq!(conv.last_message(None).unwrap().content, "done");
        assert_eq!(conv.last_message(Some("user")).unwrap().content, "open github");
        assert!(conv.last_message(Some("system")).is_none());
    }

    #[test]
    fn test_clear_conversation() {
        let mut conv = conversation();
        conv.clear();
        assert!(conv.is_empty());
        assert!(conv.last_message(None).is_none());
    }

    #[test]
    fn test_message_metadata_serialization() {
        let mut meta = Map::new();
        meta.insert("source".to_string(), json!("ws"));
        let msg = ChatMessage::new("user", "hi").with_metadata(meta);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["metadata"]["source"], "ws");

        let back: ChatMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_memory_deserialize_without_data() {
        let memory: Memory = serde_json::from_value(json!({
            "memory_id": "x",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(memory.data.is_empty());
    }
}
