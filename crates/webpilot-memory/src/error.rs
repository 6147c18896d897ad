//! Memory errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to create storage directory at {path}: {reason}")]
    CreateDirFailed { path: PathBuf, reason: String },

    #[error("Invalid memory ID: {0:?}")]
    InvalidId(String),
}
