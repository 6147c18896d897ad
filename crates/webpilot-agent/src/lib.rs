//! # webpilot Agent
//!
//! Turns chat messages into browser work.
//!
//! - [`DialogManager`]: stores the conversation, parses the message, runs
//!   each action through its [`ActionHandler`] and writes the reply
//! - [`ActionExecutor`]: runs actions on the lazily created driver, with
//!   extraction handled by the [`webpilot_extractor::DataExtractor`]
//! - [`BrowserAgent`]: wires memory, scheduler, extractor and driver
//!   together and registers the built-in handlers

mod agent;
mod dialog;
mod driver;
mod error;
mod executor;
mod handler;
mod handlers;
mod response;

#[cfg(test)]
mod test_support;

pub use agent::{BrowserAgent, TaskRequest};
pub use dialog::{DialogManager, DialogResponse};
pub use driver::{ConfigDriverFactory, DriverFactory, LazyDriver};
pub use error::AgentError;
pub use executor::ActionExecutor;
pub use handler::{ActionHandler, HandlerContext};
pub use handlers::{DriverActionHandler, ForgetHandler, RecallHandler, RememberHandler, ScheduleHandler};
pub use response::generate_response;
