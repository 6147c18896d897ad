//! # webpilot Memory
//!
//! Per-user key/value memory and conversation history, kept in memory and
//! mirrored to one JSON file per id.
//!
//! ```text
//! <data_dir>/
//! ├── memories/<id>.json
//! └── conversations/<id>.json
//! ```

mod error;
mod manager;
mod memory;

pub use error::MemoryError;
pub use manager::{sanitize_id, MemoryManager};
pub use memory::{ChatMessage, ConversationMemory, Memory};
