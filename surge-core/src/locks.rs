//! Per-character command serialization.
//!
//! Each command reads a character's attributes, then writes them back step by
//! step. Holding a character's lock for the whole command keeps two commands
//! for the same character from interleaving.

use crate::sheet::CharacterId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mutexes keyed by character id, created on first use and dropped once no
/// command holds or waits on them.
#[derive(Debug, Default)]
pub struct CharacterLocks {
    locks: Mutex<HashMap<CharacterId, Arc<Mutex<()>>>>,
}

impl CharacterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: &CharacterId) -> Arc<Mutex<()>> {
        // Poisoning leaves the map intact.
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(id.clone()).or_default().clone()
    }

    /// Run `f` while holding the lock for `id`.
    pub fn with_lock<T>(&self, id: &CharacterId, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };
        self.release(id, lock);
        result
    }

    fn release(&self, id: &CharacterId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        drop(lock);
        // Clones are only handed out under the map lock, so the count is stable here.
        if locks.get(id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(id);
        }
    }

    /// Number of characters with a command holding or waiting on their lock.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
