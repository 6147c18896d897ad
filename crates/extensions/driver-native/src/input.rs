//! Mouse and keyboard input.

use std::thread;
use std::time::Duration;

use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use thiserror::Error;

/// Input errors.
#[derive(Debug, Error)]
pub enum InputError {
    /// No input backend (no display, missing permissions).
    #[error("Input unavailable: {0}")]
    Unavailable(String),

    #[error("Input failed: {0}")]
    Failed(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<MouseButton> for Button {
    fn from(btn: MouseButton) -> Self {
        match btn {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        }
    }
}

fn failed(e: impl std::fmt::Display) -> InputError {
    InputError::Failed(e.to_string())
}

/// Thin wrapper over an `enigo` connection.
pub struct InputController {
    enigo: Enigo,
}

impl InputController {
    pub fn new() -> Result<Self, InputError> {
        let enigo =
            Enigo::new(&Settings::default()).map_err(|e| InputError::Unavailable(e.to_string()))?;
        Ok(Self { enigo })
    }

    pub fn mouse_move(&mut self, x: i32, y: i32) -> Result<(), InputError> {
        self.enigo.move_mouse(x, y, Coordinate::Abs).map_err(failed)
    }

    pub fn mouse_click(&mut self, button: MouseButton) -> Result<(), InputError> {
        self.enigo.button(button.into(), Direction::Click).map_err(failed)
    }

    /// Move to `(x, y)`, settle briefly, then click.
    pub fn click_at(&mut self, x: i32, y: i32, button: MouseButton) -> Result<(), InputError> {
        self.mouse_move(x, y)?;
        thread::sleep(Duration::from_millis(50));
        self.mouse_click(button)
    }

    /// Scroll by `notches`. Positive is down (or right when `horizontal`).
    pub fn mouse_scroll(&mut self, notches: i32, horizontal: bool) -> Result<(), InputError> {
        let axis = if horizontal { Axis::Horizontal } else { Axis::Vertical };
        self.enigo.scroll(notches, axis).map_err(failed)
    }

    pub fn type_text(&mut self, text: &str) -> Result<(), InputError> {
        self.enigo.text(text).map_err(failed)
    }

    pub fn key_press(&mut self, key: &str) -> Result<(), InputError> {
        let k = parse_key(key)?;
        self.enigo.key(k, Direction::Click).map_err(failed)
    }

    fn key_direction(&mut self, key: &str, direction: Direction) -> Result<(), InputError> {
        let k = parse_key(key)?;
        self.enigo.key(k, direction).map_err(failed)
    }

    /// Press a combination such as `["ctrl", "shift", "t"]`. Every key but
    /// the last is held while the last is clicked.
    pub fn hotkey(&mut self, keys: &[&str]) -> Result<(), InputError> {
        // Validate up front so a bad name never leaves a modifier held.
        for key in keys {
            parse_key(key)?;
        }

        let Some((last, held)) = keys.split_last() else {
            return Ok(());
        };
        for key in held {
            self.key_direction(key, Direction::Press)?;
        }
        let result = self.key_press(last);
        for key in held.iter().rev() {
            self.key_direction(key, Direction::Release)?;
        }
        result
    }

    /// Press `combo`, either a single key name or `+`-joined names.
    pub fn press_combo(&mut self, combo: &str) -> Result<(), InputError> {
        let keys = split_combo(combo);
        match keys.as_slice() {
            [] => Err(InputError::InvalidKey(combo.to_string())),
            [single] => self.key_press(single),
            many => self.hotkey(many),
        }
    }
}

/// Split `ctrl+shift+t` into its key names. A lone `+` stays a key.
pub(crate) fn split_combo(combo: &str) -> Vec<&str> {
    let combo = combo.trim();
    if combo == "+" {
        return vec!["+"];
    }
    combo
        .split('+')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect()
}

/// Parse a key name (case-insensitive) into an `enigo` key.
pub fn parse_key(key: &str) -> Result<Key, InputError> {
    let lower = key.trim().to_lowercase();
    let k = match lower.as_str() {
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "space" | "spacebar" => Key::Space,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "escape" | "esc" => Key::Escape,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "pgup" => Key::PageUp,
        "pagedown" | "pgdn" => Key::PageDown,
        "up" | "arrowup" => Key::UpArrow,
        "down" | "arrowdown" => Key::DownArrow,
        "left" | "arrowleft" => Key::LeftArrow,
        "right" | "arrowright" => Key::RightArrow,

        "ctrl" | "control" => Key::Control,
        "alt" | "option" => Key::Alt,
        "shift" => Key::Shift,
        "meta" | "cmd" | "command" | "win" | "super" => Key::Meta,

        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,

        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => return Err(InputError::InvalidKey(key.to_string())),
            }
        }
    };
    Ok(k)
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
