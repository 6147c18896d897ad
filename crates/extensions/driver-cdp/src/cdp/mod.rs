//! Chrome DevTools Protocol (CDP) client.
//!
//! Talks JSON-RPC over the browser WebSocket. One socket is shared by the
//! browser-level [`CdpClient`] and every attached [`PageSession`]; calls
//! are matched to responses by id.
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://localhost:9222").await?;
//! let page = client.new_page(None).await?;
//! page.navigate("https://example.com").await?;
//! ```

mod client;
mod error;
mod protocol;
mod session;
mod transport;

pub use client::{CdpClient, fetch_version};
pub use error::CdpError;
pub use protocol::*;
pub use session::{KeyDefinition, PageSession};
pub(crate) use session::js_string;
