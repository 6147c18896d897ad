//! Rule-based command parsing.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use webpilot_protocols::Action;

use crate::error::ParseError;

const NAVIGATE: &str = r"(?:go to|navigate to|open|visit) (?:the )?(?:website |site |page )?(?:at )?(?:https?://)?([a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(?:/[^\s]*)?)";
const CLICK: &str = r"click (?:on )?(?:the )?([^\n.]+)";
const TYPE: &str = r#"(?:type|enter|input|fill in|write) (?:the )?(?:text |value |string )?["']?([^"']+)["']? (?:in(?:to)?|on) (?:the )?([^\n.]+)"#;
const SEARCH: &str = r#"search (?:for )?["']?([^"']+)["']? (?:on|in|at) (?:the )?([^\n.]+)"#;
const GOOGLE_SEARCH: &str = r#"(?:go to|navigate to|open|visit) (?:the )?(?:website |site |page )?(?:at )?(?:https?://)?(?:www\.)?google\.com(?: and| then)? search (?:for )?["']?([^"']+)["']?"#;
const LOGIN: &str = r#"log(?:in)?(?: to| into)? (?:the )?(?:website |site |page )?(?:at )?(?:https?://)?([a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(?:/[^\s]*)?)?(?: with)?(?: username| user| email)? ["']?([^"']+)["']?(?: and)?(?: password| pass)? ["']?([^"']+)["']?"#;
const SCROLL: &str = r"scroll (?:to )?(?:the )?([^\n.]+)";
const WAIT_SECONDS: &str = r"\bwait (?:for )?(\d+(?:\.\d+)?) ?(?:seconds?|secs?)\b";
const WAIT: &str = r"wait (?:for )?(?:the )?([^\n.]+)(?: to)?(?: appear| load| be visible| be clickable)?";
const PRESS: &str = r"\bpress (?:the )?([a-z0-9+]+)(?: key)?(?: (?:on|in) (?:the )?([^\n.]+))?";
const GO_TO: &str = r"\bgo to\b";
const NUMBER: &str = r"\d+";

const WAIT_SUFFIXES: &[&str] = &[
    " to appear",
    " to load",
    " to be visible",
    " to be clickable",
    " appear",
    " load",
    " be visible",
    " be clickable",
];

const DIRECTIONS: &[&str] = &["up", "down", "left", "right"];

/// Regex rules for the common command shapes.
pub struct RuleParser {
    navigate: Regex,
    click: Regex,
    type_text: Regex,
    search: Regex,
    google_search: Regex,
    login: Regex,
    scroll: Regex,
    wait_seconds: Regex,
    wait: Regex,
    press: Regex,
    go_to: Regex,
    number: Regex,
}

fn pattern(source: &str) -> Result<Regex, ParseError> {
    Ok(RegexBuilder::new(source).case_insensitive(true).build()?)
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

impl RuleParser {
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            navigate: pattern(NAVIGATE)?,
            click: pattern(CLICK)?,
            type_text: pattern(TYPE)?,
            search: pattern(SEARCH)?,
            google_search: pattern(GOOGLE_SEARCH)?,
            login: pattern(LOGIN)?,
            scroll: pattern(SCROLL)?,
            wait_seconds: pattern(WAIT_SECONDS)?,
            wait: pattern(WAIT)?,
            press: pattern(PRESS)?,
            go_to: pattern(GO_TO)?,
            number: pattern(NUMBER)?,
        })
    }

    /// Parse `command` into actions. Every rule that matches contributes.
    pub fn parse(&self, command: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        let google = self.google_search.captures(command);

        if google.is_none() {
            if let Some(caps) = self.navigate.captures(command) {
                actions.push(Action::navigate(with_scheme(&caps[1])));
            }
        }

        if let Some(caps) = self.click.captures(command) {
            actions.push(Action::click(caps[1].trim()));
        }

        if let Some(caps) = self.type_text.captures(command) {
            actions.push(Action::type_text(&caps[1], caps[2].trim()));
        }

        if let Some(caps) = self.search.captures(command) {
            actions.push(Action::search(&caps[1], caps[2].trim()));
        }

        if let Some(caps) = google {
            actions.push(Action::navigate("https://www.google.com"));
            actions.push(Action::search(caps[1].trim(), "Google"));
        }

        if let Some(caps) = self.login.captures(command) {
            actions.push(Action::Login {
                site: caps.get(1).map(|m| with_scheme(m.as_str())),
                username: caps[2].to_string(),
                password: caps[3].to_string(),
            });
        }

        if let Some(caps) = self.scroll.captures(command) {
            actions.push(self.scroll_action(caps[1].trim()));
        }

        if let Some(caps) = self.wait_seconds.captures(command) {
            actions.push(Action::Wait {
                element: None,
                seconds: caps[1].parse().ok(),
            });
        } else if let Some(caps) = self.wait.captures(command) {
            actions.push(Action::Wait {
                element: Some(strip_wait_suffix(caps[1].trim()).to_string()),
                seconds: None,
            });
        }

        if let Some(caps) = self.press.captures(command) {
            actions.push(Action::Press {
                key: caps[1].to_string(),
                element: caps.get(2).map(|m| m.as_str().trim().to_string()),
            });
        }

        if actions.is_empty() && self.go_to.is_match(command) {
            if let Some(target) = command.split_whitespace().last() {
                let target = target.trim_end_matches(['.', ',', '!', '?']);
                actions.push(Action::navigate(with_scheme(target)));
            }
        }

        debug!("Rule parser produced {} action(s) for '{}'", actions.len(), command);
        actions
    }

    fn scroll_action(&self, target: &str) -> Action {
        let lower = target.to_lowercase();
        let first = lower.split_whitespace().next().unwrap_or_default();
        if DIRECTIONS.contains(&first) {
            return Action::Scroll {
                element: None,
                direction: Some(first.to_string()),
                amount: self
                    .number
                    .find(&lower)
                    .and_then(|m| m.as_str().parse().ok()),
            };
        }
        Action::Scroll {
            element: Some(target.to_string()),
            direction: None,
            amount: None,
        }
    }
}

fn strip_wait_suffix(element: &str) -> &str {
    for suffix in WAIT_SUFFIXES {
        if let Some(stripped) = element.strip_suffix(suffix) {
            return stripped;
        }
    }
    element
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
