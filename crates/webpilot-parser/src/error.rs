//! Parser errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),

    #[error("LLM parsing is not configured")]
    NotConfigured,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ParseError::Api {
            status: 401,
            message: "Invalid API key".to_string(),
        };
        assert_eq!(err.to_string(), "API error (401): Invalid API key");
    }

    #[test]
    fn test_invalid_response_display() {
        let err = ParseError::InvalidResponse("no choices".to_string());
        assert!(err.to_string().contains("no choices"));
    }
}
