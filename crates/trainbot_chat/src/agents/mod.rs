//! Domain agents.
//!
//! Each agent answers one area (courses, subsidies, FAQ, enrollment, human
//! contact) from the knowledge store, falling back to the language model for
//! free-form questions. Agents never fail a turn: knowledge or provider
//! errors become a fixed apology.

pub mod course;
pub mod enrollment;
pub mod faq;
pub mod human;
pub mod subsidy;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, warn};
use trainbot_kb::{KnowledgeStore, MenuKind};

pub use course::CourseAgent;
pub use enrollment::EnrollmentAgent;
pub use faq::FaqAgent;
pub use human::HumanServiceAgent;
pub use subsidy::SubsidyAgent;

use crate::config::ModelSelection;
use crate::error::ChatResult;
use crate::llm::{CompletionOptions, LanguageModel};
use crate::session::ConversationSession;
use crate::types::{ChatReply, Message};

/// Messages of history included in a generated answer (three exchanges).
pub const GENERATION_HISTORY: usize = 6;

/// Agent identity
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Course,
    Subsidy,
    Faq,
    Enrollment,
    HumanService,
}

impl AgentKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Subsidy => "subsidy",
            Self::Faq => "faq",
            Self::Enrollment => "enrollment",
            Self::HumanService => "human_service",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An agent that answers free text within its area.
#[async_trait]
pub trait DomainAgent: Send + Sync {
    fn kind(&self) -> AgentKind;

    async fn handle(&self, session: &mut ConversationSession, utterance: &str) -> ChatReply;
}

/// Dependencies shared by every agent.
#[derive(Clone)]
pub struct AgentServices {
    pub knowledge: Arc<KnowledgeStore>,
    pub llm: Arc<dyn LanguageModel>,
    pub models: ModelSelection,
}

impl AgentServices {
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        llm: Arc<dyn LanguageModel>,
        models: ModelSelection,
    ) -> Self {
        Self {
            knowledge,
            llm,
            models,
        }
    }

    /// Generate a free-form answer with the generation model.
    pub async fn generate(
        &self,
        persona: &str,
        context: &[(&str, String)],
        session: &ConversationSession,
        utterance: &str,
    ) -> ChatResult<String> {
        let messages = build_messages(
            persona,
            context,
            &session.history(Some(GENERATION_HISTORY)),
            utterance,
        );
        self.llm
            .chat(&messages, &self.models.generation, CompletionOptions::GENERATION)
            .await
    }
}

/// Persona, optional context block, recent history, then the utterance.
pub fn build_messages(
    persona: &str,
    context: &[(&str, String)],
    history: &[Message],
    utterance: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(Message::system(persona));

    if !context.is_empty() {
        let lines: Vec<String> = context
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        messages.push(Message::system(format!(
            "以下是相關資訊：\n\n{}",
            lines.join("\n")
        )));
    }

    messages.extend(history.iter().cloned());
    messages.push(Message::user(utterance));
    messages
}

/// Labels of a configured menu, or `defaults` when the menu is missing or
/// the button config cannot be read.
pub fn menu_or_default(
    knowledge: &KnowledgeStore,
    menu: MenuKind,
    defaults: &[&str],
) -> Vec<String> {
    match knowledge.menu(menu) {
        Ok(labels) if !labels.is_empty() => labels,
        Ok(_) => defaults.iter().map(|s| s.to_string()).collect(),
        Err(e) => {
            warn!(menu = menu.key(), error = %e, "Menu unavailable, using defaults");
            defaults.iter().map(|s| s.to_string()).collect()
        }
    }
}

/// First `max` characters of `text`, with "..." when cut.
pub fn preview(text: &str, max: usize) -> (String, bool) {
    if text.chars().count() <= max {
        return (text.to_string(), false);
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    (cut, true)
}

/// Turn a failed step into the fixed apology.
pub(crate) fn recover(agent: AgentKind, result: ChatResult<ChatReply>) -> ChatReply {
    result.unwrap_or_else(|e| {
        error!(agent = %agent, error = %e, "Agent failed, replying with apology");
        ChatReply::apology()
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::mock::MockLanguageModel;

    /// Services over the shipped knowledge directory.
    pub(crate) fn services(llm: MockLanguageModel) -> AgentServices {
        let root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../knowledge");
        AgentServices::new(
            Arc::new(KnowledgeStore::new(root)),
            Arc::new(llm),
            ModelSelection::uniform("test-model"),
        )
    }

    pub(crate) fn session() -> ConversationSession {
        ConversationSession::new("test-session", 20)
    }
}
