//! Native driver errors.

use thiserror::Error;

use webpilot_protocols::DriverError;

use crate::input::InputError;
use crate::ocr::OcrError;
use crate::screenshot::ScreenshotError;

#[derive(Debug, Error)]
pub enum NativeError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("Desktop task failed: {0}")]
    Task(String),
}

impl NativeError {
    /// True when the desktop cannot be driven at all, as opposed to one
    /// operation failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            NativeError::Input(InputError::Unavailable(_)) | NativeError::Screenshot(ScreenshotError::NoMonitor)
        )
    }
}

impl From<NativeError> for DriverError {
    fn from(err: NativeError) -> Self {
        if err.is_unavailable() {
            DriverError::Unavailable(err.to_string())
        } else {
            DriverError::Other(err.to_string())
        }
    }
}
