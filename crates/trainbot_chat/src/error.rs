//! Error types for the dialogue engine.

use thiserror::Error;
use trainbot_kb::KnowledgeError;

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Chat system errors.
///
/// None of these reach the user directly: agents turn them into a fixed
/// apology or a static fallback reply.
#[derive(Error, Debug)]
pub enum ChatError {
    /// No credential for the selected provider
    #[error("LLM not configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY")]
    LlmNotConfigured,

    /// Provider request failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// Provider did not answer in time
    #[error("LLM request timed out after {0}s")]
    LlmTimeout(u64),

    /// A knowledge document could not be loaded
    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// Whether the error came from the language-model provider.
    pub fn is_llm(&self) -> bool {
        matches!(
            self,
            Self::LlmNotConfigured | Self::Llm(_) | Self::LlmTimeout(_)
        )
    }
}
