//! Driver errors.

use thiserror::Error;

/// Errors raised by a [`crate::BrowserDriver`].
///
/// These describe failures of the driver itself. An action that ran but
/// did not achieve its goal is reported as a failed
/// [`crate::ActionOutcome`] instead.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Browser not connected")]
    NotConnected,

    #[error("Driver unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
