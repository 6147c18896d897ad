//! Mouse and keyboard input.

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::{KeyEventType, MouseButton, MouseEventType};

use super::core::PageSession;

/// What `Input.dispatchKeyEvent` needs to know about a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    pub key: String,
    pub code: String,
    pub key_code: u32,
    /// Text the key inserts, if any.
    pub text: Option<String>,
}

impl KeyDefinition {
    fn named(key: &str, code: &str, key_code: u32, text: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            code: code.to_string(),
            key_code,
            text: text.map(str::to_string),
        }
    }

    /// Resolve a key name such as `Enter`, `esc`, `PageDown`, `f5` or `a`.
    pub fn parse(name: &str) -> Self {
        let lower = name.to_lowercase();
        match lower.as_str() {
            "enter" | "return" => Self::named("Enter", "Enter", 13, Some("\r")),
            "tab" => Self::named("Tab", "Tab", 9, None),
            "escape" | "esc" => Self::named("Escape", "Escape", 27, None),
            "backspace" => Self::named("Backspace", "Backspace", 8, None),
            "delete" | "del" => Self::named("Delete", "Delete", 46, None),
            "space" | "spacebar" => Self::named(" ", "Space", 32, Some(" ")),
            "up" | "arrowup" => Self::named("ArrowUp", "ArrowUp", 38, None),
            "down" | "arrowdown" => Self::named("ArrowDown", "ArrowDown", 40, None),
            "left" | "arrowleft" => Self::named("ArrowLeft", "ArrowLeft", 37, None),
            "right" | "arrowright" => Self::named("ArrowRight", "ArrowRight", 39, None),
            "pageup" => Self::named("PageUp", "PageUp", 33, None),
            "pagedown" => Self::named("PageDown", "PageDown", 34, None),
            "home" => Self::named("Home", "Home", 36, None),
            "end" => Self::named("End", "End", 35, None),
            _ => {
                if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
                    if (1..=12).contains(&n) {
                        let key = format!("F{}", n);
                        return Self::named(&key, &key, 111 + n, None);
                    }
                }
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => {
                        let upper = c.to_ascii_uppercase();
                        Self::named(
                            &c.to_string(),
                            &format!("Key{}", upper),
                            upper as u32,
                            Some(c.to_string().as_str()),
                        )
                    }
                    (Some(c), None) if c.is_ascii_digit() => Self::named(
                        &c.to_string(),
                        &format!("Digit{}", c),
                        c as u32,
                        Some(c.to_string().as_str()),
                    ),
                    (Some(c), None) => Self::named(&c.to_string(), "", 0, Some(c.to_string().as_str())),
                    _ => Self::named(name, "", 0, None),
                }
            }
        }
    }
}

impl PageSession {
    pub async fn click(&self, x: f64, y: f64) -> Result<(), CdpError> {
        for event in [MouseEventType::MousePressed, MouseEventType::MouseReleased] {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": event,
                    "x": x,
                    "y": y,
                    "button": MouseButton::Left,
                    "clickCount": 1,
                })),
            )
            .await?;
        }
        debug!("Clicked at ({}, {})", x, y);
        Ok(())
    }

    /// Wheel event at `(x, y)`.
    pub async fn scroll(&self, x: f64, y: f64, delta_x: f64, delta_y: f64) -> Result<(), CdpError> {
        self.call(
            "Input.dispatchMouseEvent",
            Some(json!({
                "type": MouseEventType::MouseWheel,
                "x": x,
                "y": y,
                "button": MouseButton::None,
                "deltaX": delta_x,
                "deltaY": delta_y,
            })),
        )
        .await?;
        Ok(())
    }

    /// Insert text at the focused element.
    pub async fn insert_text(&self, text: &str) -> Result<(), CdpError> {
        self.call("Input.insertText", Some(json!({ "text": text })))
            .await?;
        debug!("Inserted {} characters", text.chars().count());
        Ok(())
    }

    /// Press a key or a `+`-joined combination such as `ctrl+shift+t`.
    pub async fn press(&self, combo: &str) -> Result<(), CdpError> {
        let parts: Vec<&str> = combo.split('+').map(str::trim).collect();
        let (key, modifier_names) = match parts.split_last() {
            Some((key, rest)) if !key.is_empty() => (*key, rest),
            _ => (combo, &[][..]),
        };
        let modifiers = Self::modifiers(modifier_names);
        let def = KeyDefinition::parse(key);

        // Shortcuts must not insert their character.
        let text = if (modifiers & !8) == 0 { def.text.clone() } else { None };

        let mut down = json!({
            "type": if text.is_some() { KeyEventType::KeyDown } else { KeyEventType::RawKeyDown },
            "key": def.key,
            "code": def.code,
            "windowsVirtualKeyCode": def.key_code,
            "modifiers": modifiers,
        });
        if let Some(text) = &text {
            down["text"] = json!(text);
        }
        self.call("Input.dispatchKeyEvent", Some(down)).await?;

        self.call(
            "Input.dispatchKeyEvent",
            Some(json!({
                "type": KeyEventType::KeyUp,
                "key": def.key,
                "code": def.code,
                "windowsVirtualKeyCode": def.key_code,
                "modifiers": modifiers,
            })),
        )
        .await?;
        Ok(())
    }

    /// CDP modifier bit mask for modifier names.
    pub(super) fn modifiers(names: &[&str]) -> i32 {
        let mut flags = 0;
        for m in names {
            match m.to_lowercase().as_str() {
                "alt" | "option" => flags |= 1,
                "control" | "ctrl" => flags |= 2,
                "meta" | "command" | "cmd" | "win" | "super" => flags |= 4,
                "shift" => flags |= 8,
                _ => {}
            }
        }
        flags
    }
}
