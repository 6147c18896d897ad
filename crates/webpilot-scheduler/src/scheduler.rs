//! The scheduler loop.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};
use webpilot_protocols::ExecutionReport;

use crate::error::SchedulerError;
use crate::store::TaskStore;
use crate::task::Task;

/// Executes a task's actions. Implemented by the agent.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, task: &Task) -> Result<ExecutionReport, SchedulerError>;
}

/// Message of the first failed action in `report`.
fn first_failure(report: &ExecutionReport) -> Option<String> {
    report.results.iter().find(|r| !r.is_success()).map(|r| {
        r.error
            .clone()
            .or_else(|| r.result.as_ref().map(|o| o.message.clone()))
            .unwrap_or_else(|| format!("{} failed", r.action.kind()))
    })
}

/// Keeps tasks, fires them when due and persists their state.
pub struct TaskScheduler {
    store: Arc<dyn TaskStore>,
    runner: Arc<dyn TaskRunner>,
    tasks: RwLock<HashMap<String, Task>>,
    check_interval: Duration,
    error_backoff: Duration,
}

impl TaskScheduler {
    pub fn new(store: Arc<dyn TaskStore>, runner: Arc<dyn TaskRunner>) -> Self {
        Self {
            store,
            runner,
            tasks: RwLock::new(HashMap::new()),
            check_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Load persisted tasks. Enabled tasks without a next run are
    /// rescheduled. Returns how many were loaded.
    pub async fn load(&self) -> Result<usize, SchedulerError> {
        let now = Utc::now();
        let mut loaded = self.store.load_all().await?;
        for task in &mut loaded {
            if task.enabled && task.next_run.is_none() {
                if let Err(e) = task.schedule_next(now) {
                    warn!("Cannot schedule task {}: {}", task.task_id, e);
                    task.enabled = false;
                    task.last_error = Some(e.to_string());
                }
            }
        }
        let count = loaded.len();
        let mut tasks = self.tasks.write();
        for task in loaded {
            tasks.insert(task.task_id.clone(), task);
        }
        info!("Loaded {} scheduled task(s)", count);
        Ok(count)
    }

    /// Schedule and persist a new task.
    pub async fn add_task(&self, mut task: Task) -> Result<Task, SchedulerError> {
        if self.tasks.read().contains_key(&task.task_id) {
            return Err(SchedulerError::DuplicateTask(task.task_id));
        }
        if task.enabled {
            task.schedule_next(Utc::now())?;
        }
        self.store.save(&task).await?;
        {
            let mut tasks = self.tasks.write();
            if tasks.contains_key(&task.task_id) {
                return Err(SchedulerError::DuplicateTask(task.task_id));
            }
            tasks.insert(task.task_id.clone(), task.clone());
        }
        info!(
            "Added task {} ({}), {} schedule, next run {:?}",
            task.task_id,
            task.name,
            task.schedule.kind(),
            task.next_run
        );
        Ok(task)
    }

    pub async fn remove_task(&self, task_id: &str) -> Result<bool, SchedulerError> {
        if self.tasks.write().remove(task_id).is_none() {
            return Ok(false);
        }
        self.store.delete(task_id).await?;
        info!("Removed task {}", task_id);
        Ok(true)
    }

    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().get(task_id).cloned()
    }

    /// All tasks, ordered by id.
    pub fn tasks(&self) -> Vec<Task> {
        let mut all: Vec<Task> = self.tasks.read().values().cloned().collect();
        all.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        all
    }

    pub async fn enable_task(&self, task_id: &str) -> Result<Task, SchedulerError> {
        let task = {
            let mut tasks = self.tasks.write();
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| SchedulerError::TaskNotFound(task_id.to_string()))?;
            task.enabled = true;
            task.schedule_next(Utc::now())?;
            task.clone()
        };
        self.store.save(&task).await?;
        info!("Enabled task {}", task_id);
        Ok(task)
    }

    pub async fn disable_task(&self, task_id: &str) -> Result<Task, SchedulerError> {
        let task = {
            let mut tasks = self.tasks.write();
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| SchedulerError::TaskNotFound(task_id.to_string()))?;
            task.enabled = false;
            task.next_run = None;
            task.clone()
        };
        self.store.save(&task).await?;
        info!("Disabled task {}", task_id);
        Ok(task)
    }

    /// Run a task now, whatever its schedule.
    pub async fn run_task(&self, task_id: &str) -> Result<ExecutionReport, SchedulerError> {
        let (task, runnable) = {
            let mut tasks = self.tasks.write();
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| SchedulerError::TaskNotFound(task_id.to_string()))?;
            let runnable = task.check_limits(Utc::now());
            (task.clone(), runnable)
        };
        if !runnable {
            self.store.save(&task).await?;
            return Err(SchedulerError::TaskDisabled(task_id.to_string()));
        }
        self.execute(task).await
    }

    async fn execute(&self, task: Task) -> Result<ExecutionReport, SchedulerError> {
        info!("Running task {} ({})", task.task_id, task.name);
        let result = self.runner.run(&task).await;
        let error = match &result {
            Ok(report) => first_failure(report),
            Err(e) => Some(e.to_string()),
        };
        match &error {
            None => info!("Task {} ({}) completed successfully", task.task_id, task.name),
            Some(e) => warn!("Task {} ({}) failed: {}", task.task_id, task.name, e),
        }

        let updated = {
            let mut tasks = self.tasks.write();
            tasks.get_mut(&task.task_id).map(|current| {
                current.record_run(Utc::now(), error);
                current.clone()
            })
        };
        // Removed while running: nothing to persist.
        if let Some(updated) = updated {
            if let Err(e) = self.store.save(&updated).await {
                error!("Failed to persist task {}: {}", updated.task_id, e);
            }
        }
        result
    }

    /// Run every due task once. Returns how many ran.
    pub async fn check_due_tasks(&self) -> Result<usize, SchedulerError> {
        let now = Utc::now();
        let mut due = Vec::new();
        let mut expired = Vec::new();
        {
            let mut tasks = self.tasks.write();
            for task in tasks.values_mut() {
                if !task.is_due(now) {
                    continue;
                }
                if task.check_limits(now) {
                    due.push(task.clone());
                } else {
                    expired.push(task.clone());
                }
            }
        }
        if !expired.is_empty() {
            self.store.save_all(&expired).await?;
        }

        let count = due.len();
        for task in due {
            debug!("Task {} is due", task.task_id);
            // Failures are recorded on the task.
            let _ = self.execute(task).await;
        }
        Ok(count)
    }

    /// Persist every task.
    pub async fn save_all(&self) -> Result<(), SchedulerError> {
        let tasks = self.tasks();
        self.store.save_all(&tasks).await
    }

    /// Check for due tasks every second until `cancel` fires, then persist
    /// all tasks.
    pub async fn run(self: Arc<Self>, mut cancel: tokio::sync::watch::Receiver<bool>) {
        info!(
            "Task scheduler started (check interval: {:?})",
            self.check_interval
        );
        let mut interval = time::interval(self.check_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.check_due_tasks().await {
                        error!("Task scheduler check failed: {}", e);
                        tokio::select! {
                            _ = time::sleep(self.error_backoff) => {}
                            _ = cancel.changed() => break,
                        }
                    }
                }
                _ = cancel.changed() => break,
            }
        }

        info!("Task scheduler shutting down");
        if let Err(e) = self.save_all().await {
            error!("Failed to persist tasks on shutdown: {}", e);
        }
    }
}

impl std::fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("tasks", &self.tasks.read().len())
            .field("check_interval", &self.check_interval)
            .finish()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
