//! # webpilot Scheduler
//!
//! Runs batches of actions on a schedule: every N seconds, on a five-field
//! cron expression, or once at a given time.
//!
//! The scheduler does not drive a browser itself. A [`TaskRunner`]
//! (implemented by the agent) executes each due task's actions.

mod error;
mod scheduler;
mod store;
mod task;

pub use error::SchedulerError;
pub use scheduler::{TaskRunner, TaskScheduler};
pub use store::{FileTaskStore, MemoryTaskStore, TaskStore, TASKS_FILE};
pub use task::{parse_cron, parse_time, Schedule, Task};
