//! Session registry with per-requester admission control
//!
//! The registry is the sole owner of the key-to-process map. Admission
//! (`try_acquire`) and teardown (`release`) are atomic under one lock, so
//! two concurrent requests for the same key can never both be admitted.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::runner::ProcessTerminator;

/// Composite admission key: at most one in-flight task per requester per
/// conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    /// Derive the key for a conversation/requester pair.
    pub fn new(channel_id: &str, author_id: &str) -> Self {
        Self(format!("{channel_id}-{author_id}"))
    }

    /// Get the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of live sessions.
///
/// Constructor-injected wherever it is used so tests can instantiate
/// isolated registries; there is no process-global state.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionKey, Option<ProcessTerminator>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Claim a key for a new session.
    ///
    /// Returns `false` when the key is already held. A failed acquire is the
    /// normal "already running" outcome, not an error; the caller answers
    /// the requester and takes no further action.
    pub fn try_acquire(&self, key: &SessionKey) -> bool {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(key) {
            return false;
        }
        sessions.insert(key.clone(), None);
        true
    }

    /// Attach the spawned process's terminate capability to a held key.
    pub fn bind(&self, key: &SessionKey, terminator: ProcessTerminator) {
        if let Some(slot) = self.sessions.lock().get_mut(key) {
            *slot = Some(terminator);
        }
    }

    /// Release a key, returning whether it was held.
    ///
    /// Idempotent: releasing an absent key is a no-op.
    pub fn release(&self, key: &SessionKey) -> bool {
        self.sessions.lock().remove(key).is_some()
    }

    /// Get the terminate capability bound to a key, if any.
    pub fn get(&self, key: &SessionKey) -> Option<ProcessTerminator> {
        self.sessions.lock().get(key).and_then(Clone::clone)
    }

    /// Snapshot of all held keys.
    pub fn active_keys(&self) -> Vec<SessionKey> {
        self.sessions.lock().keys().cloned().collect()
    }

    /// Number of held keys.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no keys are held.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
