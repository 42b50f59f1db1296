//! # trainbot_chat - Dialogue engine for the training-provider assistant
//!
//! This crate turns one user utterance into a reply plus quick-option
//! buttons:
//! - Quick-action routing for button labels
//! - Context disambiguation of short follow-ups ("3", "更多")
//! - Intent classification through a language model
//! - Domain agents for courses, subsidies, FAQ, enrollment and staff contact
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   ChatEngine    │────▶│  Disambiguator  │────▶│   Classifier    │
//! └────────┬────────┘     └────────┬────────┘     └────────┬────────┘
//!          │                       │                       │
//!          ▼                       ▼                       ▼
//! ┌─────────────────┐     ┌─────────────────────────────────────────┐
//! │  SessionStore   │     │  Course · Subsidy · FAQ · Enrollment ·  │
//! │  + Context      │     │  Human-Service agents                   │
//! └─────────────────┘     └────────────────────┬────────────────────┘
//!                                              ▼
//!                                     ┌─────────────────┐
//!                                     │ KnowledgeStore  │
//!                                     │ + LanguageModel │
//!                                     └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use trainbot_chat::{ChatEngine, ChatRequest, EngineConfig};
//!
//! # async fn run() -> trainbot_chat::ChatResult<()> {
//! let config = EngineConfig::load(None)?;
//! let engine = ChatEngine::from_config(&config);
//! let reply = engine.handle(ChatRequest::new("web-1", "待業課程")).await;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod classifier;
pub mod config;
pub mod context;
pub mod disambiguator;
pub mod engine;
pub mod error;
pub mod llm;
pub mod mock;
pub mod router;
pub mod session;
pub mod types;
pub mod vocab;

pub use agents::{AgentKind, DomainAgent};
pub use classifier::{IntentCategory, IntentClassifier, LlmIntentClassifier};
pub use config::{EngineConfig, LlmProvider, LlmSettings, ModelSelection};
pub use context::{ConversationContext, EmploymentStatus, LastAction, PAGE_SIZE};
pub use engine::ChatEngine;
pub use error::{ChatError, ChatResult};
pub use llm::{CompletionOptions, LanguageModel, LlmClient};
pub use mock::MockLanguageModel;
pub use session::{ConversationSession, SessionInfo, SessionStore};
pub use types::{ChatReply, ChatRequest, ClientDevice, Message, MessageRole};
