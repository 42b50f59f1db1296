//! Conversation sessions.
//!
//! A session holds a bounded message history and the typed
//! [`ConversationContext`]. Sessions live in memory, are created lazily on
//! first use and stay until the host ends them.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::context::ConversationContext;
use crate::types::{ClientDevice, Message, MessageRole, SessionId};

/// Snapshot of a session's bookkeeping.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionInfo {
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub has_context: bool,
}

/// A single conversation.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: SessionId,
    max_history: usize,
    messages: VecDeque<Message>,
    pub context: ConversationContext,
    /// Device class of the most recent request.
    pub device: ClientDevice,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(id: impl Into<String>, max_history: usize) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            max_history: max_history.max(1),
            messages: VecDeque::new(),
            context: ConversationContext::default(),
            device: ClientDevice::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a message, dropping the oldest ones beyond the history limit.
    pub fn append_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push_back(Message::new(role, content));
        while self.messages.len() > self.max_history {
            self.messages.pop_front();
        }
        self.updated_at = Utc::now();
    }

    /// The most recent `limit` messages (all when `None`), oldest first.
    pub fn history(&self, limit: Option<usize>) -> Vec<Message> {
        let skip = limit.map_or(0, |n| self.messages.len().saturating_sub(n));
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Reset history and context to a freshly created state.
    pub fn clear(&mut self) {
        debug!(session_id = %self.id, "Clearing session");
        let now = Utc::now();
        self.messages.clear();
        self.context = ConversationContext::default();
        self.created_at = now;
        self.updated_at = now;
    }

    pub fn session_info(&self) -> SessionInfo {
        SessionInfo {
            message_count: self.messages.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            has_context: self.context.is_set(),
        }
    }
}

/// Shared handle to one session. Held for the whole of a turn.
pub type SessionHandle = Arc<Mutex<ConversationSession>>;

/// In-memory session registry.
pub struct SessionStore {
    sessions: parking_lot::RwLock<HashMap<SessionId, SessionHandle>>,
    max_history: usize,
}

impl SessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: parking_lot::RwLock::new(HashMap::new()),
            max_history,
        }
    }

    /// Get a session, creating it if the id is unknown.
    pub fn get_or_create(&self, id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().get(id) {
            return handle.clone();
        }

        self.sessions
            .write()
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(session_id = %id, "Creating session");
                Arc::new(Mutex::new(ConversationSession::new(id, self.max_history)))
            })
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().get(id).cloned()
    }

    /// Forget a session entirely.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LastAction;

    #[test]
    fn test_history_is_bounded_fifo() {
        let mut session = ConversationSession::new("s1", 4);
        for i in 0..10 {
            session.append_message(MessageRole::User, format!("m{}", i));
            assert!(session.message_count() <= 4);
        }

        let history = session.history(None);
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m6", "m7", "m8", "m9"]);
    }

    #[test]
    fn test_history_limit_returns_most_recent() {
        let mut session = ConversationSession::new("s1", 20);
        session.append_message(MessageRole::User, "q1");
        session.append_message(MessageRole::Assistant, "a1");
        session.append_message(MessageRole::User, "q2");

        let last_two = session.history(Some(2));
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].content, "a1");
        assert_eq!(session.history(Some(50)).len(), 3);
    }

    #[test]
    fn test_history_is_a_snapshot() {
        let mut session = ConversationSession::new("s1", 20);
        session.append_message(MessageRole::User, "q1");
        let snapshot = session.history(None);
        session.append_message(MessageRole::User, "q2");
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut session = ConversationSession::new("s1", 20);
        session.append_message(MessageRole::User, "hello");
        session.context.last_action = LastAction::PromptSearch;
        assert!(session.session_info().has_context);

        session.clear();
        let info = session.session_info();
        assert_eq!(info.message_count, 0);
        assert!(!info.has_context);
    }

    #[tokio::test]
    async fn test_store_creates_lazily_and_reuses() {
        let store = SessionStore::new(20);
        assert!(store.is_empty());
        assert!(store.get("a").is_none());

        let first = store.get_or_create("a");
        first
            .lock()
            .await
            .append_message(MessageRole::User, "hi");

        let again = store.get_or_create("a");
        assert_eq!(again.lock().await.message_count(), 1);
        assert_eq!(store.len(), 1);

        assert!(store.remove("a"));
        assert!(store.get("a").is_none());
    }
}
