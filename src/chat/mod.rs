//! Chat turn orchestration, independent of HTTP.
//!
//! One turn: resolve session → load history → persist user turn → agent
//! → persist AI turn.  Each step depends on the previous one; the first
//! failure aborts the turn.  A persisted user turn is not rolled back when
//! a later step fails.

use std::sync::Arc;

use tracing::{debug, info};

use crate::agent::AgentGateway;
use crate::error::ChatError;
use crate::session::{ConversationLocks, SessionCookie, SessionManager};
use crate::store::{ChatStore, HistoryEntry, MessageType};

/// Successful turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub conversation_id: i64,
    pub reply: String,
    /// Cookie to set when the turn started a new conversation.
    pub set_cookie: Option<SessionCookie>,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ChatStore>,
    agent: Arc<dyn AgentGateway>,
    sessions: SessionManager,
    locks: Arc<ConversationLocks>,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ChatStore>,
        agent: Arc<dyn AgentGateway>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            store,
            agent,
            sessions,
            locks: Arc::new(ConversationLocks::new()),
        }
    }

    /// Handle one user message.  `cookie_header` is the raw `Cookie`
    /// request header, if any.
    pub async fn handle_message(
        &self,
        cookie_header: Option<&str>,
        message: &str,
    ) -> Result<ChatReply, ChatError> {
        let session = self.sessions.resolve(cookie_header, self.store.as_ref()).await?;
        let id = session.conversation_id;

        let _guard = self.locks.acquire(id).await;

        let history = self.store.load_history(id).await?;
        debug!(conversation_id = id, turns = history.len(), "history loaded");

        self.store.append_message(id, MessageType::User, message).await?;

        let reply = self.agent.invoke(message, &history).await?;

        self.store.append_message(id, MessageType::Ai, &reply).await?;
        info!(conversation_id = id, reply_len = reply.len(), "chat turn completed");

        Ok(ChatReply {
            conversation_id: id,
            reply,
            set_cookie: session.set_cookie,
        })
    }

    /// Stored history of `conversation_id`, oldest first.
    pub async fn history(&self, conversation_id: i64) -> Result<Vec<HistoryEntry>, ChatError> {
        self.store.load_history(conversation_id).await
    }
}
