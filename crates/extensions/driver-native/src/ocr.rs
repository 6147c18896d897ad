//! Screen text recognition through the `tesseract` CLI.
//!
//! Tesseract's TSV output gives one row per word with its bounding box and
//! confidence, which is what the driver needs to click on visible text.

use std::path::PathBuf;
use std::process::Command;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use webpilot_protocols::{DriverError, OcrEngine, OcrText, ScreenRegion};

use crate::launcher::find_tesseract;
use crate::screenshot::{self, Screenshot};

pub const DEFAULT_LANG: &str = "eng";

/// Words that name a control rather than label it.
const ROLE_WORDS: &[&str] = &[
    "button", "btn", "link", "field", "box", "input", "textbox", "icon", "tab", "menu",
];

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR failed: {0}")]
    RecognitionFailed(String),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),
}

/// Recognized text with word boxes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    /// Mean word confidence, 0.0 to 1.0.
    pub confidence: f32,
    pub blocks: Vec<TextBlock>,
}

/// One recognized word, in desktop coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
    /// Index of the text line the word belongs to.
    #[serde(default)]
    pub line: usize,
}

impl TextBlock {
    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }
}

fn normalize(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalized words to look for on screen. A trailing role word such as
/// "button" is dropped when something else remains.
pub(crate) fn needle_words(element: &str) -> Vec<String> {
    let mut words: Vec<String> = element
        .split_whitespace()
        .map(normalize)
        .filter(|w| !w.is_empty())
        .collect();
    let strip_role = words
        .last()
        .is_some_and(|last| ROLE_WORDS.contains(&last.as_str()));
    if words.len() > 1 && strip_role {
        words.pop();
    }
    words
}

impl OcrResult {
    /// Find `element` among the recognized words and return the centre of
    /// the match. Multi-word text must appear consecutively on one line.
    pub fn locate(&self, element: &str) -> Option<(i32, i32)> {
        let needle = needle_words(element);
        if needle.is_empty() {
            return None;
        }

        let words: Vec<(String, &TextBlock)> = self
            .blocks
            .iter()
            .map(|b| (normalize(&b.text), b))
            .filter(|(w, _)| !w.is_empty())
            .collect();

        for start in 0..words.len() {
            let window = &words[start..];
            if window.len() < needle.len() {
                break;
            }
            let line = window[0].1.line;
            let matched = needle
                .iter()
                .zip(window)
                .all(|(n, (w, b))| b.line == line && w == n);
            if matched {
                let boxes: Vec<&TextBlock> = window[..needle.len()].iter().map(|(_, b)| *b).collect();
                return Some(span_center(&boxes));
            }
        }

        // A single word may be part of a longer token, e.g. "Login:".
        if let [only] = needle.as_slice() {
            return words
                .iter()
                .find(|(w, _)| w.contains(only.as_str()))
                .map(|(_, b)| b.center());
        }
        None
    }
}

fn span_center(boxes: &[&TextBlock]) -> (i32, i32) {
    let left = boxes.iter().map(|b| b.x).min().unwrap_or_default();
    let top = boxes.iter().map(|b| b.y).min().unwrap_or_default();
    let right = boxes
        .iter()
        .map(|b| b.x + b.width as i32)
        .max()
        .unwrap_or_default();
    let bottom = boxes
        .iter()
        .map(|b| b.y + b.height as i32)
        .max()
        .unwrap_or_default();
    ((left + right) / 2, (top + bottom) / 2)
}

/// Parse `tesseract ... tsv` output. Word boxes are mapped from image
/// pixels to desktop coordinates with `map`.
pub(crate) fn parse_tsv(tsv: &str, map: impl Fn(i32, i32) -> (i32, i32)) -> OcrResult {
    let mut blocks = Vec::new();
    let mut lines: Vec<Vec<String>> = Vec::new();
    let mut current_key = None;
    let mut total_confidence = 0.0;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11].trim();
        let confidence: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        if text.is_empty() || confidence < 0.0 {
            continue;
        }
        let num = |i: usize| cols[i].trim().parse::<i64>().unwrap_or_default();

        let key = (num(1), num(2), num(3), num(4));
        if current_key != Some(key) {
            current_key = Some(key);
            lines.push(Vec::new());
        }
        let line = lines.len() - 1;
        lines[line].push(text.to_string());

        let (x, y) = map(num(6) as i32, num(7) as i32);
        let (right, bottom) = map((num(6) + num(8)) as i32, (num(7) + num(9)) as i32);
        let confidence = (confidence / 100.0).clamp(0.0, 1.0);
        total_confidence += confidence;
        blocks.push(TextBlock {
            text: text.to_string(),
            x,
            y,
            width: (right - x).max(0) as u32,
            height: (bottom - y).max(0) as u32,
            confidence,
            line,
        });
    }

    let confidence = if blocks.is_empty() {
        0.0
    } else {
        total_confidence / blocks.len() as f32
    };
    OcrResult {
        text: lines
            .iter()
            .map(|words| words.join(" "))
            .collect::<Vec<_>>()
            .join("\n"),
        confidence,
        blocks,
    }
}

/// Runs tesseract over screen captures.
#[derive(Debug, Clone)]
pub struct OcrController {
    lang: String,
    binary: Option<PathBuf>,
}

impl OcrController {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            binary: None,
        }
    }

    /// Use a specific tesseract binary instead of searching `PATH`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// The same engine recognizing `lang`.
    pub fn for_lang(&self, lang: &str) -> Self {
        Self {
            lang: lang.to_string(),
            binary: self.binary.clone(),
        }
    }

    fn binary(&self) -> Result<PathBuf, OcrError> {
        self.binary.clone().or_else(find_tesseract).ok_or_else(|| {
            OcrError::EngineNotAvailable(
                "tesseract is not installed or not on PATH".to_string(),
            )
        })
    }

    /// Recognize a capture. Boxes come back in desktop coordinates.
    pub fn recognize_capture(&self, shot: &Screenshot) -> Result<OcrResult, OcrError> {
        let binary = self.binary()?;
        let input = tempfile::Builder::new()
            .prefix("webpilot-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        std::fs::write(input.path(), &shot.data)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let output = Command::new(&binary)
            .arg(input.path())
            .arg("stdout")
            .args(["-l", &self.lang, "--psm", "3", "tsv"])
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    OcrError::EngineNotAvailable(format!("{}: {}", binary.display(), e))
                }
                _ => OcrError::RecognitionFailed(e.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RecognitionFailed(stderr.trim().to_string()));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let result = parse_tsv(&tsv, |x, y| shot.to_desktop(x, y));
        debug!(
            "OCR found {} word(s) with confidence {:.2}",
            result.blocks.len(),
            result.confidence
        );
        Ok(result)
    }

    /// Capture the primary monitor, or `region` of it, and recognize it.
    pub fn recognize_screen(&self, region: Option<ScreenRegion>) -> Result<OcrResult, OcrError> {
        let shot = match region {
            Some(region) => screenshot::capture_region(region),
            None => screenshot::capture_screen(),
        }
        .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        self.recognize_capture(&shot)
    }
}

impl Default for OcrController {
    fn default() -> Self {
        Self::new(DEFAULT_LANG)
    }
}

#[async_trait]
impl OcrEngine for OcrController {
    async fn recognize(
        &self,
        region: Option<ScreenRegion>,
        lang: &str,
    ) -> Result<OcrText, DriverError> {
        let controller = self.for_lang(lang);
        let result = tokio::task::spawn_blocking(move || controller.recognize_screen(region))
            .await
            .map_err(|e| DriverError::Other(e.to_string()))?
            .map_err(|e| match e {
                OcrError::EngineNotAvailable(_) => DriverError::Unavailable(e.to_string()),
                other => DriverError::Other(other.to_string()),
            })?;
        Ok(OcrText {
            text: result.text,
            region,
        })
    }
}

#[cfg(test)]
#[path = "ocr_tests.rs"]
mod tests;
