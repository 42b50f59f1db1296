//! Language-model client.
//!
//! Supports OpenAI and Anthropic APIs behind the [`LanguageModel`] trait.
//! Calls are bounded by a request timeout and never retried: callers fall
//! back to static content on any error.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::{LlmProvider, LlmSettings};
use crate::error::{ChatError, ChatResult};
use crate::types::{Message, MessageRole};

/// Sampling options for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionOptions {
    /// Intent classification: short, low-variance replies.
    pub const CLASSIFICATION: Self = Self {
        temperature: 0.3,
        max_tokens: 100,
    };

    /// Free-form answers.
    pub const GENERATION: Self = Self {
        temperature: 0.7,
        max_tokens: 1500,
    };

    /// One-line summary of the user's need.
    pub const PARAPHRASE: Self = Self {
        temperature: 0.3,
        max_tokens: 50,
    };
}

/// A chat-completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `messages` with `model` and return the reply text.
    async fn chat(
        &self,
        messages: &[Message],
        model: &str,
        options: CompletionOptions,
    ) -> ChatResult<String>;
}

/// HTTP client for the supported providers.
pub struct LlmClient {
    provider: LlmProvider,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl LlmClient {
    /// Create a client with explicit configuration
    pub fn new(provider: LlmProvider, api_key: Option<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            provider,
            api_key,
            timeout_secs,
            client,
        }
    }

    /// Create a client from settings, reading the API key from the environment.
    pub fn from_settings(settings: &LlmSettings) -> Self {
        let (provider, api_key) = settings.resolve_credentials(|key| std::env::var(key).ok());
        if api_key.is_none() {
            warn!(
                "No API key found in {}; model-backed answers will use static fallbacks",
                provider.key_var()
            );
        }
        Self::new(provider, api_key, settings.timeout_secs)
    }

    /// Get the current provider
    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ChatError {
        if e.is_timeout() {
            ChatError::LlmTimeout(self.timeout_secs)
        } else {
            ChatError::Llm(format!("Network error: {}", e))
        }
    }

    // OpenAI chat completion
    async fn chat_openai(
        &self,
        api_key: &str,
        messages: &[Message],
        model: &str,
        options: CompletionOptions,
    ) -> ChatResult<String> {
        let url = "https://api.openai.com/v1/chat/completions";

        let request = OpenAIRequest {
            model: model.to_string(),
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Llm(format!("OpenAI API error {}: {}", status, body)));
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Llm(format!("Failed to parse response: {}", e)))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ChatError::Llm("No response from OpenAI".to_string()))
    }

    // Anthropic chat completion
    async fn chat_anthropic(
        &self,
        api_key: &str,
        messages: &[Message],
        model: &str,
        options: CompletionOptions,
    ) -> ChatResult<String> {
        let url = "https://api.anthropic.com/v1/messages";

        // Anthropic takes system prompts separately; context blocks are joined in.
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let request = AnthropicRequest {
            model: model.to_string(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages: messages
                .iter()
                .filter(|m| m.role != MessageRole::System)
                .map(|m| AnthropicMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
        };

        let response = self
            .client
            .post(url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Llm(format!(
                "Anthropic API error {}: {}",
                status, body
            )));
        }

        let result: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Llm(format!("Failed to parse response: {}", e)))?;

        result
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| ChatError::Llm("No response from Anthropic".to_string()))
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn chat(
        &self,
        messages: &[Message],
        model: &str,
        options: CompletionOptions,
    ) -> ChatResult<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!(
                provider = ?self.provider,
                "LLM call attempted without {}",
                self.provider.key_var()
            );
            return Err(ChatError::LlmNotConfigured);
        };

        debug!(
            provider = ?self.provider,
            model,
            messages = messages.len(),
            "Sending completion request"
        );

        match self.provider {
            LlmProvider::OpenAI => self.chat_openai(api_key, messages, model, options).await,
            LlmProvider::Anthropic => self.chat_anthropic(api_key, messages, model, options).await,
        }
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: String,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_fails_at_call_time() {
        let client = LlmClient::new(LlmProvider::OpenAI, None, 5);
        assert!(!client.is_configured());

        let result = client
            .chat(
                &[Message::user("你好")],
                "gpt-3.5-turbo",
                CompletionOptions::CLASSIFICATION,
            )
            .await;
        assert!(matches!(result, Err(ChatError::LlmNotConfigured)));
    }

    #[test]
    fn test_completion_presets() {
        assert_eq!(CompletionOptions::CLASSIFICATION.max_tokens, 100);
        assert_eq!(CompletionOptions::GENERATION.max_tokens, 1500);
        assert_eq!(CompletionOptions::PARAPHRASE.max_tokens, 50);
        assert!((CompletionOptions::GENERATION.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_openai_request_shape() {
        let request = OpenAIRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![OpenAIMessage {
                role: MessageRole::System.as_str().to_string(),
                content: "persona".to_string(),
            }],
            temperature: 0.3,
            max_tokens: 100,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["max_tokens"], 100);
    }

    #[test]
    fn test_anthropic_response_parse() {
        let body = r#"{"content":[{"type":"text","text":"3"}],"usage":{"input_tokens":1,"output_tokens":1}}"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content[0].text, "3");
    }
}
