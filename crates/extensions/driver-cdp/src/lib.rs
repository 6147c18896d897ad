//! Level 1 browser control for webpilot over the Chrome DevTools Protocol.
//!
//! - [`cdp`]: WebSocket JSON-RPC client and page sessions
//! - [`manager`]: finds, launches and connects to the browser
//! - [`locator`]: turns element descriptions into selectors
//! - [`CdpDriver`]: the [`webpilot_protocols::BrowserDriver`] implementation

pub mod cdp;
pub mod locator;
pub mod manager;

mod driver;

pub use driver::{CANDIDATE_TIMEOUT, CdpDriver, WAIT_TIMEOUT, on_site, scroll_delta, with_scheme};
pub use manager::{BrowserError, BrowserManager, BrowserManagerConfig};
