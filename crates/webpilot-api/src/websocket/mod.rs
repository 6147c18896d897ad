//! WebSocket interface for the Level 3 agent.
//!
//! Each text frame `{"message": "..."}` is processed like `POST /message`
//! and answered with the dialog response.

mod connection;
mod handler;

pub use connection::WsConnectionManager;
pub use handler::{process_frame, ws_handler};
