//! The action handler seam.

use std::sync::Arc;

use async_trait::async_trait;
use webpilot_memory::MemoryManager;
use webpilot_protocols::{Action, ActionOutcome};

use crate::error::AgentError;

/// Who a handler is acting for.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub user_id: String,
    pub memory: Arc<MemoryManager>,
}

impl HandlerContext {
    pub fn new(user_id: impl Into<String>, memory: Arc<MemoryManager>) -> Self {
        Self {
            user_id: user_id.into(),
            memory,
        }
    }
}

/// Handles one kind of action for the dialog manager.
///
/// A failed outcome means the action ran and did not succeed; `Err` means
/// it could not run at all.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, action: &Action, ctx: &HandlerContext) -> Result<ActionOutcome, AgentError>;
}
