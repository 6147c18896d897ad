//! Chat-style message processing.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use webpilot_memory::{ChatMessage, MemoryManager};
use webpilot_parser::CommandParser;
use webpilot_protocols::{Action, ActionRecord};

use crate::error::AgentError;
use crate::handler::{ActionHandler, HandlerContext};
use crate::response::generate_response;

/// Reply to one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogResponse {
    pub user_id: String,
    pub message: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ActionRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Keeps per-user conversations and dispatches parsed actions to the
/// registered handlers.
pub struct DialogManager {
    memory: Arc<MemoryManager>,
    parser: Arc<CommandParser>,
    handlers: DashMap<String, Arc<dyn ActionHandler>>,
}

impl DialogManager {
    pub fn new(memory: Arc<MemoryManager>, parser: Arc<CommandParser>) -> Self {
        Self {
            memory,
            parser,
            handlers: DashMap::new(),
        }
    }

    pub fn memory(&self) -> &Arc<MemoryManager> {
        &self.memory
    }

    /// Register `handler` for actions of type `kind`, replacing any earlier
    /// one.
    pub fn register_handler(&self, kind: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        let kind = kind.into();
        debug!("Registered handler for {}", kind);
        self.handlers.insert(kind, handler);
    }

    pub fn has_handler(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Process one message and reply. Never fails: problems become an
    /// apologetic reply carrying `error`.
    pub async fn process_message(&self, user_id: &str, message: &str) -> DialogResponse {
        match self.try_process(user_id, message).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error processing message from {}: {}", user_id, e);
                let response = format!(
                    "I'm sorry, but I encountered an error while processing your message: {}",
                    e
                );
                let mut metadata = Map::new();
                metadata.insert("error".to_string(), Value::String(e.to_string()));
                let reply = ChatMessage::new("assistant", response.clone()).with_metadata(metadata);
                if let Err(store_err) = self.memory.add_message_to_conversation(user_id, reply) {
                    warn!("Could not store error reply for {}: {}", user_id, store_err);
                }
                DialogResponse {
                    user_id: user_id.to_string(),
                    message: message.to_string(),
                    response,
                    actions: None,
                    results: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn try_process(&self, user_id: &str, message: &str) -> Result<DialogResponse, AgentError> {
        info!("Processing message from {}", user_id);
        self.memory
            .add_message_to_conversation(user_id, ChatMessage::new("user", message))?;
        self.memory.get_or_create_memory(user_id)?;

        let actions = self.parser.parse_with_llm(message).await;
        debug!("Parsed {} action(s) from {:?}", actions.len(), message);

        let ctx = HandlerContext::new(user_id, self.memory.clone());
        let mut results = Vec::with_capacity(actions.len());
        for action in &actions {
            results.push(self.dispatch(action, &ctx).await);
        }

        let response = generate_response(&results);
        let mut metadata = Map::new();
        metadata.insert("actions".to_string(), serde_json::to_value(&actions)?);
        metadata.insert("results".to_string(), serde_json::to_value(&results)?);
        self.memory.add_message_to_conversation(
            user_id,
            ChatMessage::new("assistant", response.clone()).with_metadata(metadata),
        )?;

        Ok(DialogResponse {
            user_id: user_id.to_string(),
            message: message.to_string(),
            response,
            actions: Some(actions),
            results: Some(results),
            error: None,
        })
    }

    async fn dispatch(&self, action: &Action, ctx: &HandlerContext) -> ActionRecord {
        if let Action::Error { message } = action {
            return ActionRecord::errored(action.clone(), message.clone());
        }
        let handler = self.handlers.get(action.kind()).map(|h| Arc::clone(h.value()));
        let Some(handler) = handler else {
            warn!("No handler registered for action type: {}", action.kind());
            return ActionRecord::errored(
                action.clone(),
                format!("No handler registered for action type: {}", action.kind()),
            );
        };
        match handler.handle(action, ctx).await {
            Ok(outcome) => ActionRecord::completed(action.clone(), outcome),
            Err(e) => {
                warn!("Handler for {} failed: {}", action.kind(), e);
                ActionRecord::errored(action.clone(), e.to_string())
            }
        }
    }

    /// The user's most recent messages, oldest first.
    pub fn conversation_history(&self, user_id: &str, limit: Option<usize>) -> Vec<ChatMessage> {
        self.memory
            .get_conversation(user_id)
            .map(|conversation| conversation.messages(limit, None))
            .unwrap_or_default()
    }

    /// Returns false when the user has no conversation.
    pub fn clear_conversation_history(&self, user_id: &str) -> Result<bool, AgentError> {
        Ok(self.memory.clear_conversation(user_id)?)
    }

    pub fn user_memory(&self, user_id: &str) -> Option<Map<String, Value>> {
        self.memory.get_memory(user_id).map(|memory| memory.data)
    }

    /// Returns false when the user has no memory yet.
    pub fn update_user_memory(&self, user_id: &str, key: &str, value: Value) -> Result<bool, AgentError> {
        Ok(self.memory.update_memory(user_id, key, value)?.is_some())
    }

    /// Returns false when the user has no memory.
    pub fn clear_user_memory(&self, user_id: &str) -> Result<bool, AgentError> {
        if self.memory.get_memory(user_id).is_none() {
            return Ok(false);
        }
        self.memory.set_memory_data(user_id, Map::new())?;
        Ok(true)
    }
}

impl std::fmt::Debug for DialogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        kinds.sort();
        f.debug_struct("DialogManager")
            .field("handlers", &kinds)
            .field("uses_llm", &self.parser.uses_llm())
            .finish()
    }
}

#[cfg(test)]
#[path = "dialog_tests.rs"]
mod tests;
