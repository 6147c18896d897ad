use super::*;
use serde_json::json;

#[test]
fn test_navigate_serialize() {
    let action = Action::navigate("https://example.com");
    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json, json!({"type": "navigate", "url": "https://example.com"}));
}

#[test]
fn test_type_action_uses_type_tag() {
    let action: Action =
        serde_json::from_value(json!({"type": "type", "text": "hello", "element": "search box"}))
            .unwrap();
    assert_eq!(action, Action::type_text("hello", "search box"));
    assert_eq!(action.kind(), "type");
}

#[test]
fn test_optional_fields_omitted() {
    let action = Action::Scroll {
        element: Some("footer".to_string()),
        direction: None,
        amount: None,
    };
    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json, json!({"type": "scroll", "element": "footer"}));
}

#[test]
fn test_unknown_type_is_preserved() {
    let action: Action = serde_json::from_value(json!({"type": "teleport", "to": "mars"})).unwrap();
    assert_eq!(
        action,
        Action::Unknown {
            kind: "teleport".to_string()
        }
    );
    assert_eq!(action.kind(), "teleport");

    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json, json!({"type": "teleport"}));
}

#[test]
fn test_missing_required_field_is_an_error() {
    let result: Result<Action, _> = serde_json::from_value(json!({"type": "click"}));
    assert!(result.is_err());
}

#[test]
fn test_missing_type_is_an_error() {
    let result: Result<Action, _> = serde_json::from_value(json!({"url": "https://a.com"}));
    assert!(result.is_err());
}

#[test]
fn test_schedule_defaults() {
    let action: Action = serde_json::from_value(json!({
        "type": "schedule",
        "name": "Check news",
        "actions": [{"type": "navigate", "url": "https://news.ycombinator.com"}]
    }))
    .unwrap();

    match action {
        Action::Schedule(spec) => {
            assert_eq!(spec.name.as_deref(), Some("Check news"));
            assert_eq!(spec.schedule_type, "interval");
            assert_eq!(spec.interval, 3600);
            assert_eq!(spec.actions.len(), 1);
            assert_eq!(spec.actions[0].kind(), "navigate");
        }
        other => panic!("expected schedule, got {:?}", other),
    }
}

#[test]
fn test_extract_params() {
    let action: Action = serde_json::from_value(json!({
        "type": "extract",
        "extraction_type": "table",
        "params": {"selector": "#prices", "format": "csv"}
    }))
    .unwrap();

    match action {
        Action::Extract {
            extraction_type,
            params,
            ..
        } => {
            assert_eq!(extraction_type.as_deref(), Some("table"));
            assert_eq!(params["format"], "csv");
        }
        other => panic!("expected extract, got {:?}", other),
    }
}

#[test]
fn test_remember_value_defaults_to_null() {
    let action: Action = serde_json::from_value(json!({"type": "remember", "key": "city"})).unwrap();
    assert_eq!(
        action,
        Action::Remember {
            key: Some("city".to_string()),
            value: Value::Null
        }
    );
}

#[test]
fn test_kinds_cover_vocabulary() {
    for kind in Action::KINDS {
        assert_ne!(*kind, "unknown");
    }
    assert_eq!(Action::KINDS.len(), 14);
}
