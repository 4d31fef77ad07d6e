//! Session Registry
//!
//! The set of live sessions, keyed by never-reused ids.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::CancelToken;

/// Identifies one admitted session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Live sessions and their cancellation tokens
///
/// ## Concurrency:
/// - `sessions`: one mutex serializes insert/remove/cancel_all
/// - `next_id`: atomic counter (lock-free)
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<CancelToken>>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: Arc<CancelToken>) -> SessionId {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sessions.lock().insert(id, token);
        id
    }

    /// Returns false if `id` was not registered
    pub fn remove(&self, id: SessionId) -> bool {
        self.sessions.lock().remove(&id).is_some()
    }

    /// Cancel every registered session, returning how many were signalled
    ///
    /// Tokens are cancelled after the registry lock is released, so exiting
    /// sessions can deregister concurrently.
    pub fn cancel_all(&self) -> usize {
        let tokens: Vec<Arc<CancelToken>> = self.sessions.lock().values().cloned().collect();
        for token in &tokens {
            token.cancel();
        }
        tokens.len()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
