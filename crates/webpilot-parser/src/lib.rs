//! # webpilot Parser
//!
//! Turns commands such as `Go to github.com` or
//! `Type 'hello world' in the search box` into [`Action`]s.
//!
//! Rule-based parsing is always available. When `[llm]` is enabled the
//! command is sent to an OpenAI-compatible chat completion endpoint instead.
//!
//! [`Action`]: webpilot_protocols::Action

mod api;
mod error;
mod llm;
mod parser;
mod rules;

pub use error::ParseError;
pub use llm::LlmParser;
pub use parser::CommandParser;
pub use rules::RuleParser;
