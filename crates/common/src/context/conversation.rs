//! Per-session conversation history
//!
//! Each session keeps its most recent turns in a bounded FIFO. Sessions live
//! for the lifetime of the process; nothing is persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Default number of turns retained per session
pub const DEFAULT_MAX_TURNS: usize = 10;

/// One user message and the reply it received
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub user_message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(user_message: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            response: response.into(),
            timestamp: Utc::now(),
        }
    }
}

type SessionHistory = Arc<Mutex<VecDeque<ConversationTurn>>>;

/// Shared store of bounded conversation histories keyed by session
///
/// The outer map lock is held only to look up or create a session; appends
/// and reads take that session's own lock, so unrelated sessions never
/// contend.
pub struct ContextStore {
    sessions: RwLock<HashMap<String, SessionHistory>>,
    max_turns: usize,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl ContextStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns: max_turns.max(1),
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    async fn existing(&self, key: &str) -> Option<SessionHistory> {
        self.sessions.read().await.get(key).cloned()
    }

    async fn get_or_create(&self, key: &str) -> SessionHistory {
        if let Some(history) = self.existing(key).await {
            return history;
        }

        let mut sessions = self.sessions.write().await;
        let history = sessions
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::with_capacity(self.max_turns))))
            .clone();
        crate::metrics::record_context_sessions(sessions.len());
        history
    }

    /// Append a turn, evicting the oldest ones beyond the bound
    pub async fn append(&self, key: &str, turn: ConversationTurn) {
        let history = self.get_or_create(key).await;
        let mut turns = history.lock().await;
        turns.push_back(turn);
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
    }

    /// Up to `n` most recent turns, oldest first
    pub async fn recent(&self, key: &str, n: usize) -> Vec<ConversationTurn> {
        let Some(history) = self.existing(key).await else {
            return Vec::new();
        };
        let turns = history.lock().await;
        let skip = turns.len().saturating_sub(n);
        turns.iter().skip(skip).cloned().collect()
    }

    /// Full retained history, oldest first
    pub async fn history(&self, key: &str) -> Vec<ConversationTurn> {
        self.recent(key, self.max_turns).await
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_eleventh_turn_evicts_oldest() {
        let store = ContextStore::default();
        for i in 0..11 {
            store
                .append("s1", ConversationTurn::new(format!("q{}", i), format!("a{}", i)))
                .await;
        }

        let history = store.history("s1").await;
        assert_eq!(history.len(), 10);
        let messages: Vec<&str> = history.iter().map(|t| t.user_message.as_str()).collect();
        let expected: Vec<String> = (1..11).map(|i| format!("q{}", i)).collect();
        assert_eq!(messages, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_recent_returns_tail_in_order() {
        let store = ContextStore::new(10);
        for i in 0..5 {
            store.append("s", ConversationTurn::new(format!("q{}", i), "a")).await;
        }
        let recent = store.recent("s", 3).await;
        let messages: Vec<&str> = recent.iter().map(|t| t.user_message.as_str()).collect();
        assert_eq!(messages, vec!["q2", "q3", "q4"]);
    }

    #[tokio::test]
    async fn test_unknown_session_is_empty_and_not_created() {
        let store = ContextStore::default();
        assert!(store.recent("missing", 3).await.is_empty());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = Arc::new(ContextStore::default());
        let mut handles = Vec::new();
        for session in ["a", "b"] {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for i in 0..20 {
                    store
                        .append(session, ConversationTurn::new(format!("{}{}", session, i), "ok"))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.session_count().await, 2);
        let a = store.history("a").await;
        assert_eq!(a.len(), 10);
        assert!(a.iter().all(|t| t.user_message.starts_with('a')));
        assert_eq!(a.last().unwrap().user_message, "a19");
    }
}
