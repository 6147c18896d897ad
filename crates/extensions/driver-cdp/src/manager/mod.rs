//! Browser process and connection manager.
//!
//! Finds and launches a Chromium-family browser with remote debugging,
//! connects to it lazily and keeps one active page.

mod manager_core;
mod manager_types;

pub use manager_core::BrowserManager;
pub use manager_types::{BrowserError, BrowserManagerConfig};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
