//! CDP page session for interacting with a single tab.

mod core;
mod dom;
mod input;
mod js;
mod navigation;

pub use self::core::PageSession;
pub use self::input::KeyDefinition;

/// Quote a value as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
