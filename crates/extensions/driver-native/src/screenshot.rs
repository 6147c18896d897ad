//! Screen capture.

use std::io::Cursor;

use screenshots::Screen;
use screenshots::image::{ImageOutputFormat, RgbaImage};
use thiserror::Error;

use webpilot_protocols::ScreenRegion;

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("No monitor found")]
    NoMonitor,
}

/// A PNG capture and where it sits on the desktop.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub data: Vec<u8>,
    /// Image size in physical pixels.
    pub width: u32,
    pub height: u32,
    /// Desktop position of the top-left pixel, in logical points.
    pub origin: (i32, i32),
    /// Physical pixels per logical point.
    pub scale_factor: f32,
}

impl Screenshot {
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Map a pixel position in the image to desktop coordinates.
    pub fn to_desktop(&self, x: i32, y: i32) -> (i32, i32) {
        let scale = if self.scale_factor > 0.0 { self.scale_factor } else { 1.0 };
        (
            self.origin.0 + (x as f32 / scale).round() as i32,
            self.origin.1 + (y as f32 / scale).round() as i32,
        )
    }
}

fn primary_screen() -> Result<Screen, ScreenshotError> {
    let screens = Screen::all().map_err(|e| ScreenshotError::CaptureFailed(e.to_string()))?;
    let mut fallback = None;
    for screen in screens {
        if screen.display_info.is_primary {
            return Ok(screen);
        }
        fallback.get_or_insert(screen);
    }
    fallback.ok_or(ScreenshotError::NoMonitor)
}

fn encode(image: &RgbaImage) -> Result<Vec<u8>, ScreenshotError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .map_err(|e| ScreenshotError::EncodingFailed(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Capture the primary monitor.
pub fn capture_screen() -> Result<Screenshot, ScreenshotError> {
    let screen = primary_screen()?;
    let image = screen
        .capture()
        .map_err(|e| ScreenshotError::CaptureFailed(e.to_string()))?;
    let info = screen.display_info;
    Ok(Screenshot {
        data: encode(&image)?,
        width: image.width(),
        height: image.height(),
        origin: (info.x, info.y),
        scale_factor: info.scale_factor,
    })
}

/// Capture `region` of the primary monitor. Coordinates are relative to
/// the monitor.
pub fn capture_region(region: ScreenRegion) -> Result<Screenshot, ScreenshotError> {
    let screen = primary_screen()?;
    let image = screen
        .capture_area(region.x, region.y, region.width, region.height)
        .map_err(|e| ScreenshotError::CaptureFailed(e.to_string()))?;
    let info = screen.display_info;
    Ok(Screenshot {
        data: encode(&image)?,
        width: image.width(),
        height: image.height(),
        origin: (info.x + region.x, info.y + region.y),
        scale_factor: info.scale_factor,
    })
}

/// Logical size of the primary monitor.
pub fn screen_size() -> Result<(u32, u32), ScreenshotError> {
    let info = primary_screen()?.display_info;
    Ok((info.width, info.height))
}
