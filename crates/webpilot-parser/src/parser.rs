//! Command parser facade.

use tracing::info;

use webpilot_config::LlmConfig;
use webpilot_protocols::Action;

use crate::error::ParseError;
use crate::llm::LlmParser;
use crate::rules::RuleParser;

/// Parses natural-language commands with the rules, or with the LLM when
/// one is configured.
pub struct CommandParser {
    rules: RuleParser,
    llm: Option<LlmParser>,
}

impl CommandParser {
    /// Build a parser. The LLM is used only when `llm` is enabled and has a key.
    pub fn new(llm: &LlmConfig) -> Result<Self, ParseError> {
        let llm = llm.is_usable().then(|| LlmParser::new(llm.clone()));
        if let Some(parser) = &llm {
            info!("LLM command parsing enabled (model {})", parser.config().model);
        }
        Ok(Self {
            rules: RuleParser::new()?,
            llm,
        })
    }

    /// A parser that only uses the rules.
    pub fn rules_only() -> Result<Self, ParseError> {
        Ok(Self {
            rules: RuleParser::new()?,
            llm: None,
        })
    }

    pub fn uses_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Rule-based parse.
    pub fn parse(&self, command: &str) -> Vec<Action> {
        self.rules.parse(command)
    }

    /// LLM parse when configured, rule-based otherwise.
    pub async fn parse_with_llm(&self, command: &str) -> Vec<Action> {
        match &self.llm {
            Some(llm) => llm.parse(command).await,
            None => self.rules.parse(command),
        }
    }
}
