//! # webpilot Config
//!
//! Application configuration (TOML) and the per-browser profile store.

mod error;
mod loader;
mod profile;
mod schema;
mod validator;

pub use error::{ConfigError, ProfileError};
pub use loader::ConfigLoader;
pub use profile::{BrowserProfile, Cookie, ProfileOutcome, ProfileStore, ProxyConfig, WindowSize};
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
