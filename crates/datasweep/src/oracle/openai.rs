//! OpenAI-compatible chat-completions oracle.
//!
//! Works against the OpenAI API and any service exposing the same
//! `/chat/completions` contract. Only compiled with the "ai" feature.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::Oracle;
use crate::error::{Result, SweepError};

/// Default API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for planning and scoring calls.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default timeout for API requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default temperature (low for consistent structured replies).
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Default max tokens for replies.
const DEFAULT_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

/// Configuration for the OpenAI oracle.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// The model to use (e.g., "gpt-4o-mini").
    pub model: String,
    /// Temperature for response generation (0.0 - 2.0).
    pub temperature: f32,
    /// Maximum tokens in the response.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Endpoint URL (useful for proxies or compatible services).
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl OpenAiConfig {
    /// Create a new configuration builder.
    pub fn builder() -> OpenAiConfigBuilder {
        OpenAiConfigBuilder::default()
    }
}

/// Builder for [`OpenAiConfig`].
#[derive(Default)]
pub struct OpenAiConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
    base_url: Option<String>,
}

impl OpenAiConfigBuilder {
    /// Set the model to use.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature (0.0 - 2.0).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Set a custom endpoint URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiConfig {
        OpenAiConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// Oracle backed by an OpenAI-compatible chat-completions endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use datasweep::oracle::{OpenAiConfig, OpenAiOracle};
///
/// let oracle = OpenAiOracle::new("your-api-key")?;
///
/// let config = OpenAiConfig::builder()
///     .model("gpt-4o")
///     .timeout_secs(20)
///     .build();
/// let oracle = OpenAiOracle::with_config("your-api-key", config)?;
/// ```
pub struct OpenAiOracle {
    api_key: String,
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiOracle {
    /// Create a new oracle with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, OpenAiConfig::default())
    }

    /// Create a new oracle with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_config(api_key: impl Into<String>, config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            config,
            client,
        })
    }
}

impl Oracle for OpenAiOracle {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            return Err(SweepError::OracleError(format!(
                "API error {}: {}",
                response.status(),
                response.text()?
            )));
        }

        let result: ChatResponse = response.json()?;

        result
            .choices
            .as_ref()
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.message.as_ref())
            .map(|msg| msg.content.clone())
            .ok_or_else(|| SweepError::OracleError("No response content from API".to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Response parsing tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_valid_response_structure() {
        let json = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"steps\": []}"
                }
            }]
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let choices = response.choices.unwrap();
        assert_eq!(choices.len(), 1);
        assert_eq!(
            choices[0].message.as_ref().unwrap().content,
            "{\"steps\": []}"
        );
    }

    #[test]
    fn test_parse_response_with_empty_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(response.choices.unwrap().is_empty());
    }

    #[test]
    fn test_parse_response_with_null_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": null}"#).unwrap();
        assert!(response.choices.is_none());
    }

    #[test]
    fn test_parse_response_missing_message() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": null}]}"#).unwrap();
        assert!(response.choices.unwrap()[0].message.is_none());
    }

    // -------------------------------------------------------------------------
    // Config builder tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_config_builder_defaults() {
        let config = OpenAiConfig::builder().build();

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_builder_custom_values() {
        let config = OpenAiConfig::builder()
            .model("gpt-4o")
            .temperature(0.3)
            .max_tokens(500)
            .timeout_secs(10)
            .base_url("https://proxy.example.com/v1/chat/completions")
            .build();

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.base_url, "https://proxy.example.com/v1/chat/completions");
    }

    // -------------------------------------------------------------------------
    // Oracle trait tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_oracle_identity() {
        let oracle = OpenAiOracle::new("test-key").unwrap();
        assert_eq!(oracle.name(), "OpenAI");
        assert_eq!(oracle.model(), DEFAULT_MODEL);
    }
}
