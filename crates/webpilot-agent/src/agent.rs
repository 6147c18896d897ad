//! The Level 3 browser agent.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use webpilot_config::{Config, ProfileStore};
use webpilot_driver_native::OcrController;
use webpilot_extractor::DataExtractor;
use webpilot_memory::MemoryManager;
use webpilot_parser::CommandParser;
use webpilot_protocols::{Action, ExecutionReport, ScheduleSpec};
use webpilot_scheduler::{FileTaskStore, Task, TaskScheduler};

use crate::dialog::{DialogManager, DialogResponse};
use crate::driver::{ConfigDriverFactory, DriverFactory, LazyDriver};
use crate::error::AgentError;
use crate::executor::ActionExecutor;
use crate::handler::ActionHandler;
use crate::handlers::{
    DriverActionHandler, ForgetHandler, RecallHandler, RememberHandler, ScheduleHandler, validate_times,
};

const DRIVER_ACTIONS: &[&str] = &[
    "navigate", "click", "type", "search", "login", "scroll", "wait", "press", "extract",
];

/// A request to schedule actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub name: String,
    pub actions: Vec<Action>,
    #[serde(default = "default_schedule_type")]
    pub schedule_type: String,
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runs: Option<u32>,
}

fn default_schedule_type() -> String {
    "interval".to_string()
}

fn default_interval() -> u64 {
    3600
}

impl From<TaskRequest> for ScheduleSpec {
    fn from(request: TaskRequest) -> Self {
        ScheduleSpec {
            task_id: request.task_id,
            name: Some(request.name),
            schedule_type: request.schedule_type,
            interval: request.interval,
            cron: request.cron,
            start_time: request.start_time,
            end_time: request.end_time,
            max_runs: request.max_runs,
            actions: request.actions,
        }
    }
}

struct SchedulerHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Memory, dialog, scheduler, extraction and a lazily created browser,
/// wired together.
pub struct BrowserAgent {
    agent_id: String,
    config: Config,
    memory: Arc<MemoryManager>,
    dialog: DialogManager,
    scheduler: Arc<TaskScheduler>,
    profiles: Arc<ProfileStore>,
    executor: Arc<ActionExecutor>,
    running: Mutex<Option<SchedulerHandle>>,
}

impl BrowserAgent {
    /// Build an agent whose driver follows `config.browser`.
    pub async fn new(config: Config) -> Result<Self, AgentError> {
        let profiles = Arc::new(ProfileStore::new(config.profiles_dir()));
        let factory = Arc::new(ConfigDriverFactory::new(config.clone(), profiles.clone()));
        Self::with_factory(config, profiles, factory).await
    }

    /// Build an agent whose driver comes from `factory`.
    pub async fn with_factory(
        config: Config,
        profiles: Arc<ProfileStore>,
        factory: Arc<dyn DriverFactory>,
    ) -> Result<Self, AgentError> {
        let agent_id = Uuid::new_v4().to_string();
        let memory = Arc::new(MemoryManager::new(config.memory_dir())?);
        let parser = Arc::new(CommandParser::new(&config.llm)?);
        let extractor = DataExtractor::new()?.with_ocr(Arc::new(OcrController::default()));

        let driver = Arc::new(LazyDriver::new(factory));
        let executor = Arc::new(ActionExecutor::new(driver, extractor));

        let store = Arc::new(FileTaskStore::new(config.scheduler_dir()).await?);
        let scheduler = Arc::new(
            TaskScheduler::new(store, executor.clone())
                .with_check_interval(Duration::from_secs(config.scheduler.check_interval_secs.max(1)))
                .with_error_backoff(Duration::from_secs(config.scheduler.error_backoff_secs)),
        );
        scheduler.load().await?;

        let dialog = DialogManager::new(memory.clone(), parser);
        let browser: Arc<dyn ActionHandler> = Arc::new(DriverActionHandler::new(executor.clone()));
        for kind in DRIVER_ACTIONS {
            dialog.register_handler(*kind, browser.clone());
        }
        dialog.register_handler("schedule", Arc::new(ScheduleHandler::new(scheduler.clone())));
        dialog.register_handler("remember", Arc::new(RememberHandler));
        dialog.register_handler("recall", Arc::new(RecallHandler));
        dialog.register_handler("forget", Arc::new(ForgetHandler));

        info!("Browser agent {} ready", agent_id);
        Ok(Self {
            agent_id,
            config,
            memory,
            dialog,
            scheduler,
            profiles,
            executor,
            running: Mutex::new(None),
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn memory(&self) -> &Arc<MemoryManager> {
        &self.memory
    }

    pub fn dialog(&self) -> &DialogManager {
        &self.dialog
    }

    pub fn scheduler(&self) -> &Arc<TaskScheduler> {
        &self.scheduler
    }

    pub fn profiles(&self) -> &Arc<ProfileStore> {
        &self.profiles
    }

    pub fn executor(&self) -> &Arc<ActionExecutor> {
        &self.executor
    }

    pub async fn process_message(&self, user_id: &str, message: &str) -> DialogResponse {
        self.dialog.process_message(user_id, message).await
    }

    /// Validate and schedule a task.
    pub async fn schedule_task(&self, request: TaskRequest) -> Result<Task, AgentError> {
        let spec = ScheduleSpec::from(request);
        validate_times(&spec).map_err(AgentError::InvalidRequest)?;
        let task = Task::from_spec(&spec)?;
        Ok(self.scheduler.add_task(task).await?)
    }

    pub fn scheduled_tasks(&self) -> Vec<Task> {
        self.scheduler.tasks()
    }

    /// Run a task now, outside its schedule.
    pub async fn run_task(&self, task_id: &str) -> Result<ExecutionReport, AgentError> {
        Ok(self.scheduler.run_task(task_id).await?)
    }

    /// Returns false when no such task exists.
    pub async fn remove_task(&self, task_id: &str) -> Result<bool, AgentError> {
        Ok(self.scheduler.remove_task(task_id).await?)
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Spawn the scheduler loop. Does nothing if it is already running.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running.is_some() {
            return;
        }
        let (cancel, rx) = watch::channel(false);
        let task = tokio::spawn(self.scheduler.clone().run(rx));
        *running = Some(SchedulerHandle { cancel, task });
        info!("Agent {} started", self.agent_id);
    }

    /// Stop the scheduler, persist tasks and close the browser.
    pub async fn stop(&self) -> Result<(), AgentError> {
        let handle = self.running.lock().take();
        match handle {
            Some(handle) => {
                let _ = handle.cancel.send(true);
                if let Err(e) = handle.task.await {
                    warn!("Scheduler task ended abnormally: {}", e);
                    self.scheduler.save_all().await?;
                }
            }
            None => self.scheduler.save_all().await?,
        }
        self.executor.driver().close().await?;
        info!("Agent {} stopped", self.agent_id);
        Ok(())
    }
}

impl std::fmt::Debug for BrowserAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserAgent")
            .field("agent_id", &self.agent_id)
            .field("dialog", &self.dialog)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
