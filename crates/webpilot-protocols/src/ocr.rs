//! Screen text recognition protocol.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// A rectangular region of the screen, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRegion {
    /// Parse a region from a JSON value: either `[x, y, w, h]` or
    /// `{"x":..,"y":..,"width":..,"height":..}`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if let Some(items) = value.as_array() {
            if items.len() != 4 {
                return None;
            }
            let nums: Vec<i64> = items.iter().filter_map(|v| v.as_i64()).collect();
            if nums.len() != 4 || nums[2] <= 0 || nums[3] <= 0 {
                return None;
            }
            return Some(Self {
                x: nums[0] as i32,
                y: nums[1] as i32,
                width: nums[2] as u32,
                height: nums[3] as u32,
            });
        }
        serde_json::from_value(value.clone()).ok()
    }
}

/// Text recognized on screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<ScreenRegion>,
}

/// Recognizes text on the screen.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Capture the screen (or `region` of it) and run OCR with `lang`.
    async fn recognize(
        &self,
        region: Option<ScreenRegion>,
        lang: &str,
    ) -> Result<OcrText, DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_region_from_array() {
        let region = ScreenRegion::from_value(&json!([10, 20, 300, 400])).unwrap();
        assert_eq!(
            region,
            ScreenRegion {
                x: 10,
                y: 20,
                width: 300,
                height: 400
            }
        );
    }

    #[test]
    fn test_region_from_object() {
        let region =
            ScreenRegion::from_value(&json!({"x": 0, "y": 0, "width": 50, "height": 60})).unwrap();
        assert_eq!(region.width, 50);
    }

    #[test]
    fn test_region_rejects_bad_shapes() {
        assert!(ScreenRegion::from_value(&json!([1, 2, 3])).is_none());
        assert!(ScreenRegion::from_value(&json!([1, 2, 0, 4])).is_none());
        assert!(ScreenRegion::from_value(&json!("full")).is_none());
    }
}
