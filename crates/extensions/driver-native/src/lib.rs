//! # webpilot Native Driver
//!
//! Level 2 browser control through the operating system: synthetic keyboard
//! and mouse input via `enigo`, screen capture via `screenshots`, and text
//! location via the `tesseract` command-line OCR engine.
//!
//! ## Components
//!
//! - [`InputController`] - Mouse and keyboard input
//! - [`OcrController`] - Screen text recognition with word boxes
//! - [`NativeDriver`] - [`webpilot_protocols::BrowserDriver`] over the above
//!
//! The driver talks to the desktop through the [`Desktop`] trait so it can
//! run against a scripted desktop in tests.

mod desktop;
mod driver;
mod error;
mod input;
mod launcher;
mod ocr;
mod screenshot;

pub use desktop::{Desktop, SystemDesktop};
pub use driver::{NativeDriver, Timing, parse_coordinates, primary_modifier, scroll_units};
pub use error::NativeError;
pub use input::{InputController, InputError, MouseButton, parse_key};
pub use launcher::{BrowserCommand, LaunchSpec, find_executable, find_tesseract};
pub use ocr::{OcrController, OcrError, OcrResult, TextBlock, DEFAULT_LANG};
pub use screenshot::{Screenshot, ScreenshotError, capture_region, capture_screen, screen_size};
