//! Conversation history storage.
//!
//! The engine reads history per session before a request and the caller
//! appends the exchange afterwards. Persistent stores live outside this
//! crate; [`InMemoryHistoryStore`] serves interactive sessions and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tourism_types::ChatTurn;

use crate::error::OrchestratorError;

/// Read/append access to per-session conversation history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Prior turns for a session, oldest first. Unknown sessions are empty.
    async fn get_history(&self, session_id: &str) -> Result<Vec<ChatTurn>, OrchestratorError>;

    async fn append_turn(&self, session_id: &str, turn: ChatTurn) -> Result<(), OrchestratorError>;

    /// Append a question and its answer.
    async fn record_exchange(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<(), OrchestratorError> {
        self.append_turn(session_id, ChatTurn::user(question)).await?;
        self.append_turn(session_id, ChatTurn::assistant(answer))
            .await
    }
}

/// History kept in process memory.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    sessions: RwLock<HashMap<String, Vec<ChatTurn>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn get_history(&self, session_id: &str) -> Result<Vec<ChatTurn>, OrchestratorError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_turn(&self, session_id: &str, turn: ChatTurn) -> Result<(), OrchestratorError> {
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .push(turn);
        Ok(())
    }
}
