//! Process-wide turn configuration.
//!
//! ```rust
//! use fchat::ChatPolicy;
//!
//! let policy: ChatPolicy = serde_json::from_str(
//!     r#"{"default_llm": {"provider": "openai", "model": "gpt-4o-mini"}}"#,
//! )
//! .expect("policy should parse");
//!
//! assert!(policy.validate().is_ok());
//! assert_eq!(policy.retry_policy.max_attempts, 1);
//! ```

use std::time::Duration;

use fprovider::{LlmConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

use crate::ChatError;

pub const ROUTING_FALLBACK_TEXT: &str = "Apologies, I'm not quite sure I understand. Could you please provide additional clarification or context?";

pub const CONTENT_FILTER_TEXT: &str = "The response was filtered due to the prompt triggering our content management policy. Please modify your prompt and retry.";

pub const MODEL_FAILURE_TEXT: &str =
    "Sorry, something went wrong while generating a response. Please try again.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPolicy {
    /// Provider and model used when an agent does not name both.
    pub default_llm: LlmConfig,
    pub routing_fallback_text: String,
    pub content_filter_text: String,
    pub model_failure_text: String,
    pub retry_policy: RetryPolicy,
    pub context_hook_timeout: Option<Duration>,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            default_llm: LlmConfig::default(),
            routing_fallback_text: ROUTING_FALLBACK_TEXT.to_string(),
            content_filter_text: CONTENT_FILTER_TEXT.to_string(),
            model_failure_text: MODEL_FAILURE_TEXT.to_string(),
            retry_policy: RetryPolicy::single_attempt(),
            context_hook_timeout: None,
        }
    }
}

impl ChatPolicy {
    pub fn with_default_llm(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.default_llm.provider = Some(provider.into());
        self.default_llm.model = Some(model.into());
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_context_hook_timeout(mut self, timeout: Duration) -> Self {
        self.context_hook_timeout = Some(timeout);
        self
    }

    pub fn with_routing_fallback_text(mut self, text: impl Into<String>) -> Self {
        self.routing_fallback_text = text.into();
        self
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.retry_policy.max_attempts == 0 {
            return Err(ChatError::invalid_request(
                "retry_policy.max_attempts must be at least 1",
            ));
        }

        for (field, text) in [
            ("routing_fallback_text", &self.routing_fallback_text),
            ("content_filter_text", &self.content_filter_text),
            ("model_failure_text", &self.model_failure_text),
        ] {
            if text.trim().is_empty() {
                return Err(ChatError::invalid_request(format!(
                    "{field} must not be empty"
                )));
            }
        }

        if let Some(timeout) = self.context_hook_timeout
            && timeout.is_zero()
        {
            return Err(ChatError::invalid_request(
                "context_hook_timeout must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid_and_uses_single_attempt() {
        let policy = ChatPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.retry_policy.max_attempts, 1);
        assert_eq!(policy.routing_fallback_text, ROUTING_FALLBACK_TEXT);
    }

    #[test]
    fn blank_texts_and_zero_timeouts_are_rejected() {
        let blank = ChatPolicy::default().with_routing_fallback_text("  ");
        assert!(blank.validate().is_err());

        let zero = ChatPolicy::default().with_context_hook_timeout(Duration::ZERO);
        assert!(zero.validate().is_err());
    }
}
