use super::*;

#[test]
fn test_parse_key_letters_and_digits() {
    for c in ('a'..='z').chain('0'..='9') {
        assert_eq!(parse_key(&c.to_string()).unwrap(), Key::Unicode(c));
    }
}

#[test]
fn test_parse_key_uppercase_letter_is_lowered() {
    assert_eq!(parse_key("L").unwrap(), Key::Unicode('l'));
}

#[test]
fn test_parse_key_named() {
    assert_eq!(parse_key("Enter").unwrap(), Key::Return);
    assert_eq!(parse_key("return").unwrap(), Key::Return);
    assert_eq!(parse_key("ESC").unwrap(), Key::Escape);
    assert_eq!(parse_key("del").unwrap(), Key::Delete);
    assert_eq!(parse_key("PageDown").unwrap(), Key::PageDown);
    assert_eq!(parse_key("ArrowUp").unwrap(), Key::UpArrow);
    assert_eq!(parse_key(" tab ").unwrap(), Key::Tab);
}

#[test]
fn test_parse_key_modifiers() {
    assert_eq!(parse_key("ctrl").unwrap(), Key::Control);
    assert_eq!(parse_key("Control").unwrap(), Key::Control);
    assert_eq!(parse_key("alt").unwrap(), Key::Alt);
    assert_eq!(parse_key("shift").unwrap(), Key::Shift);
    for name in ["meta", "cmd", "command", "win", "super"] {
        assert_eq!(parse_key(name).unwrap(), Key::Meta, "{}", name);
    }
}

#[test]
fn test_parse_key_function_keys() {
    for n in 1..=12 {
        assert!(parse_key(&format!("F{}", n)).is_ok());
    }
    assert!(parse_key("f13").is_err());
}

#[test]
fn test_parse_key_punctuation() {
    assert_eq!(parse_key("/").unwrap(), Key::Unicode('/'));
    assert_eq!(parse_key("+").unwrap(), Key::Unicode('+'));
}

#[test]
fn test_parse_key_invalid() {
    let err = parse_key("hyperdrive").unwrap_err();
    assert_eq!(err.to_string(), "Invalid key: hyperdrive");
    assert!(parse_key("").is_err());
}

#[test]
fn test_split_combo() {
    assert_eq!(split_combo("ctrl+shift+t"), vec!["ctrl", "shift", "t"]);
    assert_eq!(split_combo("Enter"), vec!["Enter"]);
    assert_eq!(split_combo(" ctrl + l "), vec!["ctrl", "l"]);
    assert_eq!(split_combo("+"), vec!["+"]);
    assert!(split_combo("").is_empty());
}

#[test]
fn test_mouse_button_conversion() {
    assert_eq!(Button::from(MouseButton::Left), Button::Left);
    assert_eq!(Button::from(MouseButton::Right), Button::Right);
    let parsed: MouseButton = serde_json::from_str("\"middle\"").unwrap();
    assert_eq!(parsed, MouseButton::Middle);
}

#[test]
fn test_input_error_display() {
    assert_eq!(
        InputError::Unavailable("no display".to_string()).to_string(),
        "Input unavailable: no display"
    );
    assert_eq!(
        InputError::Failed("x11".to_string()).to_string(),
        "Input failed: x11"
    );
}
