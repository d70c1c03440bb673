//! In-memory registry of per-conversation sessions.
//!
//! The workflow engine is the registry's only writer: within one
//! conversation, updates are handled one at a time, so a session is read,
//! mutated, and written back inside a single handling task. The lock only
//! guards the map against access from unrelated conversations.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracs_core::session::Session;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<i64, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the conversation's session, creating an idle one
    /// on first access.
    pub async fn snapshot(&self, chat_id: i64) -> Session {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&chat_id) {
                return session.clone();
            }
        }
        let mut sessions = self.sessions.write().await;
        sessions.entry(chat_id).or_default().clone()
    }

    /// Writes the conversation's session back.
    pub async fn store(&self, chat_id: i64, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(chat_id, session);
    }

    /// Resets the conversation to an idle session.
    pub async fn reset(&self, chat_id: i64) {
        self.store(chat_id, Session::default()).await;
    }
}
