//! Data extraction for webpilot.
//!
//! Pulls text, HTML fragments, tables, lists and images out of a page, and
//! screen text through an injected [`webpilot_protocols::OcrEngine`].
//!
//! HTML comes from, in order: an inline `html` parameter, a `url` fetched
//! over HTTP, or the page the active driver is showing.

mod csv;
mod error;
mod extractor;
mod html;
mod save;

pub use csv::{to_csv, write_record};
pub use error::ExtractError;
pub use extractor::{DataExtractor, ExtractionKind, ExtractionOutput, OutputFormat};
pub use save::{save_columns, save_data, SavedFile};
