//! # webpilot Protocols
//!
//! Shared vocabulary for the webpilot workspace. Contains only types and
//! trait definitions, no browser or OS code.
//!
//! ## Core Types
//!
//! - [`Action`] - A single browser-automation primitive produced by the parser
//! - [`ActionOutcome`] - The `{success, message, ...}` result of one action
//! - [`ExecutionReport`] - The `{results: [...]}` result of a batch
//!
//! ## Core Traits
//!
//! - [`BrowserDriver`] - Executes actions against a browser (CDP or OS input)
//! - [`OcrEngine`] - Recognizes text on screen for OCR extraction

pub mod action;
pub mod driver;
pub mod error;
pub mod ocr;
pub mod outcome;

pub use action::{Action, ScheduleSpec};
pub use driver::BrowserDriver;
pub use error::DriverError;
pub use ocr::{OcrEngine, OcrText, ScreenRegion};
pub use outcome::{ActionOutcome, ActionRecord, ExecutionReport};
