//! Built-in action handlers.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use webpilot_protocols::{Action, ActionOutcome, ScheduleSpec};
use webpilot_scheduler::{SchedulerError, Task, TaskScheduler, parse_time};

use crate::error::AgentError;
use crate::executor::ActionExecutor;
use crate::handler::{ActionHandler, HandlerContext};

/// Browser and extraction actions, run through the [`ActionExecutor`].
#[derive(Debug, Clone)]
pub struct DriverActionHandler {
    executor: Arc<ActionExecutor>,
}

impl DriverActionHandler {
    pub fn new(executor: Arc<ActionExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ActionHandler for DriverActionHandler {
    async fn handle(&self, action: &Action, _ctx: &HandlerContext) -> Result<ActionOutcome, AgentError> {
        self.executor.execute_action(action).await
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Check the optional start and end times of a schedule request.
pub(crate) fn validate_times(spec: &ScheduleSpec) -> Result<(), String> {
    if let Some(start) = non_blank(&spec.start_time) {
        if parse_time(start).is_err() {
            return Err(format!("Invalid start time format: {}", start));
        }
    }
    if let Some(end) = non_blank(&spec.end_time) {
        if parse_time(end).is_err() {
            return Err(format!("Invalid end time format: {}", end));
        }
    }
    Ok(())
}

/// `schedule` actions: add a task to the scheduler.
#[derive(Debug, Clone)]
pub struct ScheduleHandler {
    scheduler: Arc<TaskScheduler>,
}

impl ScheduleHandler {
    pub fn new(scheduler: Arc<TaskScheduler>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl ActionHandler for ScheduleHandler {
    async fn handle(&self, action: &Action, _ctx: &HandlerContext) -> Result<ActionOutcome, AgentError> {
        let Action::Schedule(spec) = action else {
            return Ok(ActionOutcome::unknown_action(action.kind()));
        };
        if let Err(message) = validate_times(spec) {
            return Ok(ActionOutcome::fail(message));
        }
        let task = match Task::from_spec(spec) {
            Ok(task) => task,
            Err(e) => return Ok(ActionOutcome::fail(e.to_string())),
        };
        let (task_id, name) = (task.task_id.clone(), task.name.clone());

        match self.scheduler.add_task(task).await {
            Ok(task) => {
                info!("Scheduled task {} ({})", task.task_id, task.name);
                Ok(ActionOutcome::ok(format!("Scheduled task {} ({})", task.task_id, task.name))
                    .with("task_id", task.task_id))
            }
            Err(SchedulerError::DuplicateTask(_)) => {
                warn!("Task {} already exists", task_id);
                Ok(ActionOutcome::fail(format!("Failed to schedule task {} ({})", task_id, name)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// How a remembered value reads in a reply: strings bare, the rest as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `remember` actions: store a value in the user's memory.
#[derive(Debug, Clone, Default)]
pub struct RememberHandler;

#[async_trait]
impl ActionHandler for RememberHandler {
    async fn handle(&self, action: &Action, ctx: &HandlerContext) -> Result<ActionOutcome, AgentError> {
        let Action::Remember { key, value } = action else {
            return Ok(ActionOutcome::unknown_action(action.kind()));
        };
        let Some(key) = key else {
            return Ok(ActionOutcome::fail("No key specified for remember action"));
        };
        ctx.memory.get_or_create_memory(&ctx.user_id)?;
        ctx.memory.update_memory(&ctx.user_id, key, value.clone())?;
        Ok(ActionOutcome::ok(format!("Remembered {}: {}", key, display_value(value))))
    }
}

/// `recall` actions: read a value from the user's memory.
#[derive(Debug, Clone, Default)]
pub struct RecallHandler;

#[async_trait]
impl ActionHandler for RecallHandler {
    async fn handle(&self, action: &Action, ctx: &HandlerContext) -> Result<ActionOutcome, AgentError> {
        let Action::Recall { key } = action else {
            return Ok(ActionOutcome::unknown_action(action.kind()));
        };
        let Some(key) = key else {
            return Ok(ActionOutcome::fail("No key specified for recall action"));
        };
        let value = ctx
            .memory
            .get_memory(&ctx.user_id)
            .and_then(|memory| memory.get(key).cloned());
        match value {
            Some(value) => Ok(ActionOutcome::ok(format!("Recalled {}: {}", key, display_value(&value)))
                .with("value", value)),
            None => Ok(ActionOutcome::fail(format!("No memory found for key: {}", key))),
        }
    }
}

/// `forget` actions: drop a value from the user's memory.
#[derive(Debug, Clone, Default)]
pub struct ForgetHandler;

#[async_trait]
impl ActionHandler for ForgetHandler {
    async fn handle(&self, action: &Action, ctx: &HandlerContext) -> Result<ActionOutcome, AgentError> {
        let Action::Forget { key } = action else {
            return Ok(ActionOutcome::unknown_action(action.kind()));
        };
        let Some(key) = key else {
            return Ok(ActionOutcome::fail("No key specified for forget action"));
        };
        ctx.memory.remove_memory_key(&ctx.user_id, key)?;
        Ok(ActionOutcome::ok(format!("Forgot {}", key)))
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
