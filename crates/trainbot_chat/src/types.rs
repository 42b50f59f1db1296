//! Core types for the dialogue engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Unique identifier for a conversation
pub type SessionId = String;

/// Upper bound on quick options attached to a reply.
pub const MAX_QUICK_OPTIONS: usize = 8;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Assistant,
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Assistant => "assistant",
            Self::User => "user",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}

/// Class of client the request came from. Affects how links render.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientDevice {
    #[default]
    Desktop,
    Mobile,
}

impl std::str::FromStr for ClientDevice {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            other => Err(ChatError::Config(format!("unknown device class '{}'", other))),
        }
    }
}

/// One user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: SessionId,
    pub utterance: String,
    #[serde(default)]
    pub device: ClientDevice,
}

impl ChatRequest {
    pub fn new(session_id: impl Into<String>, utterance: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            utterance: utterance.into(),
            device: ClientDevice::default(),
        }
    }

    pub fn with_device(mut self, device: ClientDevice) -> Self {
        self.device = device;
        self
    }
}

/// Structured reply for one turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub content: String,
    #[serde(rename = "quickOptions")]
    pub quick_options: Vec<String>,
}

impl ChatReply {
    /// Build a reply, keeping at most [`MAX_QUICK_OPTIONS`] options.
    pub fn new<I, S>(content: impl Into<String>, quick_options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            content: content.into(),
            quick_options: quick_options
                .into_iter()
                .map(Into::into)
                .take(MAX_QUICK_OPTIONS)
                .collect(),
        }
    }

    /// Fixed apology used whenever a turn cannot be served.
    pub fn apology() -> Self {
        Self::new(
            "抱歉，系統暫時無法處理您的請求，請稍後再試或聯絡客服。",
            ["聯絡客服"],
        )
    }
}
