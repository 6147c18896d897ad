//! LLM-backed command parsing.

use regex::RegexBuilder;
use tracing::{debug, error};

use webpilot_config::LlmConfig;
use webpilot_protocols::Action;

use crate::api::{ApiMessage, ApiRequest, ApiResponse};
use crate::error::ParseError;

const SYSTEM_PROMPT: &str = "You are a browser automation assistant that parses natural language commands into structured actions.";

const USER_PROMPT: &str = r#"Parse the following natural language command into a structured JSON format for browser automation.
The output should be a JSON list of actions, where each action has a "type" and additional parameters.

Supported action types:
- navigate: Go to a URL (parameters: url)
- click: Click on an element (parameters: element)
- type: Type text into an input field (parameters: element, text)
- search: Search for something on a site (parameters: site, query)
- login: Log into a site (parameters: site, username, password)
- scroll: Scroll to an element or in a direction (parameters: element or direction, amount)
- wait: Wait for an element to appear or for a number of seconds (parameters: element or seconds)
- press: Press a key or key combination (parameters: key, element)
- extract: Extract data (parameters: extraction_type, selector, format)
- schedule: Run actions later (parameters: name, schedule_type, interval, cron, actions)
- remember / recall / forget: Manage user memory (parameters: key, value)

Command: "#;

/// Sends commands to an OpenAI-compatible chat completion endpoint.
pub struct LlmParser {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlmParser {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Parse `command`. Failures become a single `error` action.
    pub async fn parse(&self, command: &str) -> Vec<Action> {
        match self.request_actions(command).await {
            Ok(actions) => actions,
            Err(e) => {
                error!("Error in LLM parsing: {}", e);
                vec![Action::error(format!("Failed to parse command with LLM: {}", e))]
            }
        }
    }

    /// Ask the model for actions.
    pub async fn request_actions(&self, command: &str) -> Result<Vec<Action>, ParseError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ParseError::NotConfigured)?;

        let request = ApiRequest {
            model: self.config.model.clone(),
            messages: vec![
                ApiMessage::system(SYSTEM_PROMPT),
                ApiMessage::user(format!("{}{}\n\nOutput JSON:", USER_PROMPT, command)),
            ],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ParseError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ParseError::Api { status, message });
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| ParseError::InvalidResponse(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ParseError::InvalidResponse("empty completion".to_string()))?;

        debug!("LLM returned: {}", content);
        actions_from_content(&content)
    }
}

/// Pull the JSON action list out of a completion, fenced or not.
pub(crate) fn actions_from_content(content: &str) -> Result<Vec<Action>, ParseError> {
    let fenced = RegexBuilder::new(r"```json\n(.*?)\n```")
        .dot_matches_new_line(true)
        .build()?;

    let mut json = match fenced.captures(content) {
        Some(caps) => caps[1].to_string(),
        None => content.to_string(),
    };
    json = json.trim().to_string();
    if json.len() >= 6 && json.starts_with("```") && json.ends_with("```") {
        json = json[3..json.len() - 3].trim().to_string();
    }

    let value: serde_json::Value =
        serde_json::from_str(&json).map_err(|e| ParseError::InvalidResponse(e.to_string()))?;
    let value = match value {
        serde_json::Value::Array(_) => value,
        other => serde_json::Value::Array(vec![other]),
    };
    serde_json::from_value(value).map_err(|e| ParseError::InvalidResponse(e.to_string()))
}
