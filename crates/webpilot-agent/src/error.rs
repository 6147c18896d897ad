//! Agent errors.

use thiserror::Error;
use webpilot_extractor::ExtractError;
use webpilot_memory::MemoryError;
use webpilot_parser::ParseError;
use webpilot_protocols::DriverError;
use webpilot_scheduler::SchedulerError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A request the agent refuses before doing any work.
    #[error("{0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_messages() {
        let err: AgentError = SchedulerError::TaskNotFound("t1".to_string()).into();
        assert_eq!(err.to_string(), "Task not found: t1");

        let err: AgentError = DriverError::NotConnected.into();
        assert_eq!(err.to_string(), "Browser not connected");

        let err = AgentError::InvalidRequest("Invalid start time format: soon".to_string());
        assert_eq!(err.to_string(), "Invalid start time format: soon");
    }
}
