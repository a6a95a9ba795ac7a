//! Per-user conversation phase tracking.
//!
//! In-memory only; entries live for the process lifetime. Concurrent writes
//! for the same user are last-write-wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Opaque per-user key, taken from the platform's user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserKey(pub u64);

impl From<u64> for UserKey {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether free text is currently expected from a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A word was accepted and is being processed.
    Idle,
    AwaitingWord,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    phases: Mutex<HashMap<UserKey, Phase>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase for `user`, or `None` if the user never sent `/start`.
    pub fn get(&self, user: UserKey) -> Option<Phase> {
        self.lock().get(&user).copied()
    }

    pub fn set(&self, user: UserKey, phase: Phase) {
        self.lock().insert(user, phase);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move `user` to `Idle` and return a guard that puts them back to
    /// `AwaitingWord` when dropped, whatever happens in between.
    pub fn begin_processing(&self, user: UserKey) -> ProcessingGuard<'_> {
        self.set(user, Phase::Idle);
        ProcessingGuard { store: self, user }
    }

    // A poisoned map is still a valid map; phases are plain values.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserKey, Phase>> {
        self.phases.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Returned by [`SessionStore::begin_processing`].
#[derive(Debug)]
pub struct ProcessingGuard<'a> {
    store: &'a SessionStore,
    user: UserKey,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.store.set(self.user, Phase::AwaitingWord);
    }
}
