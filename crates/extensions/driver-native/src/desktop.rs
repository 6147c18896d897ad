//! The desktop the native driver acts on.

use webpilot_protocols::ScreenRegion;

use crate::error::NativeError;
use crate::input::{InputController, MouseButton};
use crate::ocr::{OcrController, OcrResult};

/// Blocking desktop operations. The driver calls these from
/// `spawn_blocking`.
pub trait Desktop: Send + Sync {
    /// Press a key or a `+`-joined combination.
    fn press(&self, combo: &str) -> Result<(), NativeError>;

    fn type_text(&self, text: &str) -> Result<(), NativeError>;

    /// Left-click at desktop coordinates.
    fn click(&self, x: i32, y: i32) -> Result<(), NativeError>;

    /// Scroll by wheel notches. Positive is down, or right when
    /// `horizontal`.
    fn scroll(&self, notches: i32, horizontal: bool) -> Result<(), NativeError>;

    /// Capture the screen, or `region` of it, and recognize its text.
    fn read_screen(&self, region: Option<ScreenRegion>, lang: &str) -> Result<OcrResult, NativeError>;
}

/// The real desktop: `enigo` input, `screenshots` capture and tesseract.
#[derive(Debug, Default, Clone)]
pub struct SystemDesktop {
    ocr: OcrController,
}

impl SystemDesktop {
    pub fn new(ocr: OcrController) -> Self {
        Self { ocr }
    }
}

impl Desktop for SystemDesktop {
    fn press(&self, combo: &str) -> Result<(), NativeError> {
        InputController::new()?.press_combo(combo)?;
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<(), NativeError> {
        InputController::new()?.type_text(text)?;
        Ok(())
    }

    fn click(&self, x: i32, y: i32) -> Result<(), NativeError> {
        InputController::new()?.click_at(x, y, MouseButton::Left)?;
        Ok(())
    }

    fn scroll(&self, notches: i32, horizontal: bool) -> Result<(), NativeError> {
        InputController::new()?.mouse_scroll(notches, horizontal)?;
        Ok(())
    }

    fn read_screen(&self, region: Option<ScreenRegion>, lang: &str) -> Result<OcrResult, NativeError> {
        Ok(self.ocr.for_lang(lang).recognize_screen(region)?)
    }
}
