//! Reply text for a batch of action results.

use serde_json::Value;
use webpilot_protocols::{Action, ActionOutcome, ActionRecord};

const NOTHING_TO_DO: &str = "I'm not sure what you want me to do. Could you please be more specific?";
const ALL_DONE: &str = "I've completed the tasks you requested.";
const SOME_FAILED: &str = "I encountered some issues while trying to complete your requests.";
const SAMPLE_CHARS: usize = 100;
const SAMPLE_ITEMS: usize = 3;

/// Summarize `records` as a chat reply.
pub fn generate_response(records: &[ActionRecord]) -> String {
    if records.is_empty() {
        return NOTHING_TO_DO.to_string();
    }

    let mut response = String::new();
    if records.iter().all(ActionRecord::is_success) {
        response.push_str(ALL_DONE);
        for record in records {
            if let Some(outcome) = &record.result {
                push_line(&mut response, &done_line(&record.action, outcome));
                if let Action::Extract { .. } = record.action {
                    if let Some(sample) = outcome.get("data").and_then(sample) {
                        response.push_str(&format!("\n  Sample: {}", sample));
                    }
                }
            }
        }
    } else {
        response.push_str(SOME_FAILED);
        for record in records {
            let line = match (&record.error, &record.result) {
                (Some(error), _) => format!("Failed to {}: {}", record.action.kind(), error),
                (None, Some(outcome)) if !outcome.success => {
                    format!("Failed to {}: {}", record.action.kind(), outcome.message)
                }
                (None, Some(outcome)) => success_line(&record.action, outcome),
                (None, None) => format!("Failed to {}: Unknown error", record.action.kind()),
            };
            push_line(&mut response, &line);
        }
    }
    response
}

fn push_line(response: &mut String, line: &str) {
    response.push_str("\n- ");
    response.push_str(line);
}

fn extract_source(action: &Action) -> &str {
    match action {
        Action::Extract { selector, params, .. } => selector
            .as_deref()
            .or_else(|| params.get("selector").and_then(Value::as_str))
            .unwrap_or("the page"),
        _ => "the page",
    }
}

fn done_line(action: &Action, outcome: &ActionOutcome) -> String {
    match action {
        Action::Navigate { url } => format!("Navigated to {}", url),
        Action::Click { element } => format!("Clicked on {}", element),
        Action::Type { text, element } => format!("Typed '{}' into {}", text, element),
        Action::Search { query, site } => format!("Searched for '{}' on {}", query, site),
        Action::Extract { .. } => format!("Extracted data from {}", extract_source(action)),
        _ => outcome.message.clone(),
    }
}

fn success_line(action: &Action, outcome: &ActionOutcome) -> String {
    match action {
        Action::Navigate { url } => format!("Successfully navigated to {}", url),
        Action::Click { element } => format!("Successfully clicked on {}", element),
        Action::Type { text, element } => format!("Successfully typed '{}' into {}", text, element),
        Action::Search { query, site } => {
            format!("Successfully searched for '{}' on {}", query, site)
        }
        Action::Extract { .. } => {
            format!("Successfully extracted data from {}", extract_source(action))
        }
        _ => outcome.message.clone(),
    }
}

/// A short preview of extracted data, or `None` when there is nothing to
/// show.
fn sample(data: &Value) -> Option<String> {
    match data {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => {
            if s.chars().count() > SAMPLE_CHARS {
                let head: String = s.chars().take(SAMPLE_CHARS).collect();
                Some(format!("{}...", head))
            } else {
                Some(s.clone())
            }
        }
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => {
            let head: Vec<Value> = items.iter().take(SAMPLE_ITEMS).cloned().collect();
            Some(Value::Array(head).to_string())
        }
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => {
            let head: serde_json::Map<String, Value> = map
                .iter()
                .take(SAMPLE_ITEMS)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Some(Value::Object(head).to_string())
        }
        Value::Null | Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
