//! Extraction errors.

use thiserror::Error;

/// Errors raised while extracting or saving data.
///
/// The `Display` text is what callers see as the failed outcome message.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unknown extraction type: {0}")]
    UnknownType(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("{0}")]
    NotFound(String),

    #[error("No HTML source: pass `html` or `url`, or open a page first")]
    NoSource,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR is not available: {0}")]
    OcrUnavailable(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ExtractError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}
