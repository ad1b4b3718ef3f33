//! In-memory session store: conversation id → ordered user/assistant history.
//!
//! Each conversation's history sits behind its own async mutex. The outer map
//! lock is only held for the lookup/insert, so a slow completion on one
//! conversation never blocks another. Holding a [`SessionGuard`] makes a
//! read → complete → append sequence atomic for that conversation.
//!
//! Histories are unbounded unless a `max_turns` cap is given, in which case
//! the oldest exchanges are dropped first (FIFO).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::llm::ChatMessage;

type History = Arc<Mutex<Vec<ChatMessage>>>;

pub struct SessionStore {
    sessions: Mutex<HashMap<String, History>>,
    max_turns: Option<usize>,
}

impl SessionStore {
    pub fn new(max_turns: Option<usize>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_turns,
        }
    }

    /// Return the history slot for `id`, registering an empty one if absent.
    async fn slot(&self, id: &str) -> History {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(conversation_id = %id, "session created");
                Arc::new(Mutex::new(Vec::new()))
            })
            .clone()
    }

    async fn existing_slot(&self, id: &str) -> Option<History> {
        self.sessions.lock().await.get(id).cloned()
    }

    /// Snapshot of the history for `id`; an empty session is created if absent.
    pub async fn get_or_create(&self, id: &str) -> Vec<ChatMessage> {
        self.slot(id).await.lock().await.clone()
    }

    /// Append `user` then `assistant` to the history for `id`, creating it if needed.
    pub async fn append_exchange(&self, id: &str, user: ChatMessage, assistant: ChatMessage) {
        let mut guard = self.lock(id).await;
        guard.append_exchange(user, assistant);
    }

    /// Empty the history for `id`. Returns `false` (and creates nothing) when
    /// the conversation was never referenced.
    pub async fn clear(&self, id: &str) -> bool {
        match self.existing_slot(id).await {
            Some(history) => {
                history.lock().await.clear();
                debug!(conversation_id = %id, "session cleared");
                true
            }
            None => false,
        }
    }

    /// Exclusive access to the history for `id`, created lazily.
    ///
    /// Other callers locking the same id wait until the guard is dropped.
    pub async fn lock(&self, id: &str) -> SessionGuard {
        let history = self.slot(id).await.lock_owned().await;
        SessionGuard { history, max_turns: self.max_turns }
    }

    /// Number of conversations referenced so far (cleared ones included).
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Exclusive handle on one conversation's history.
pub struct SessionGuard {
    history: OwnedMutexGuard<Vec<ChatMessage>>,
    max_turns: Option<usize>,
}

impl SessionGuard {
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn append_exchange(&mut self, user: ChatMessage, assistant: ChatMessage) {
        self.history.push(user);
        self.history.push(assistant);
        if let Some(cap) = self.max_turns {
            let max_len = cap.saturating_mul(2);
            if self.history.len() > max_len {
                let excess = self.history.len() - max_len;
                self.history.drain(..excess);
            }
        }
    }
}
