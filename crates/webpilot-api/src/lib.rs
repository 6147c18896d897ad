//! # webpilot API
//!
//! HTTP and WebSocket surface over the parser, drivers, extractor, browser
//! profiles and the Level 3 agent.
//!
//! ```text
//! /interact, /extract              Level 1/2: pooled drivers and the extractor
//! /config/*                        Level 2: per-browser profile
//! /message, /task, /tasks, ...     Level 3: dialog, scheduler, memory
//! /ws/{user_id}                    Level 3 over WebSocket
//! /health
//! ```

pub mod error;
pub mod http;
pub mod server;
pub mod state;
pub mod websocket;

#[cfg(test)]
mod test_support;

pub use error::ApiError;
pub use http::{ApiResponse, create_router};
pub use server::ApiServer;
pub use state::{AppState, DriverPool};
pub use websocket::WsConnectionManager;
