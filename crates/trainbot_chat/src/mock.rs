//! Mock language model for testing.
//!
//! Provides a configurable [`LanguageModel`] that returns queued replies and
//! captures every call, so dialogue flows can be tested without a provider.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{ChatError, ChatResult};
use crate::llm::{CompletionOptions, LanguageModel};
use crate::types::Message;

/// Predefined outcome for one call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Failure(String),
    Timeout,
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub messages: Vec<Message>,
    pub model: String,
    pub options: CompletionOptions,
}

impl CapturedCall {
    /// Content of the last message in the call.
    pub fn last_content(&self) -> &str {
        self.messages.last().map(|m| m.content.as_str()).unwrap_or("")
    }
}

/// Mock language model.
///
/// Replies are consumed in order. Once the queue is empty every call fails,
/// which is how tests force the static fallbacks.
#[derive(Clone, Default)]
pub struct MockLanguageModel {
    replies: Arc<RwLock<VecDeque<MockReply>>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn add_response(self, text: impl Into<String>) -> Self {
        self.replies.write().push_back(MockReply::Text(text.into()));
        self
    }

    /// Queue a provider failure.
    pub fn add_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .write()
            .push_back(MockReply::Failure(message.into()));
        self
    }

    /// Queue a timeout.
    pub fn add_timeout(self) -> Self {
        self.replies.write().push_back(MockReply::Timeout);
        self
    }

    /// Fail every call regardless of the queue.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Replies still queued.
    pub fn pending(&self) -> usize {
        self.replies.read().len()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn chat(
        &self,
        messages: &[Message],
        model: &str,
        options: CompletionOptions,
    ) -> ChatResult<String> {
        self.captured_calls.write().push(CapturedCall {
            messages: messages.to_vec(),
            model: model.to_string(),
            options,
        });

        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(ChatError::Llm(msg));
        }

        match self.replies.write().pop_front() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Failure(msg)) => Err(ChatError::Llm(msg)),
            Some(MockReply::Timeout) => Err(ChatError::LlmTimeout(30)),
            None => Err(ChatError::Llm("no mock reply queued".to_string())),
        }
    }
}
