//! In-process session store.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::keys::SessionKey;
use crate::store::{SessionStore, StoreError};

/// Non-durable store, used in tests and for short-lived tools.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with entries.
    pub fn with_entries<I, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (SessionKey, V)>,
        V: Into<String>,
    {
        let entries = entries.into_iter().map(|(k, v)| (k, v.into())).collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.entries.read().get(&key).cloned()
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        self.entries.write().insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), StoreError> {
        self.entries.write().remove(&key);
        Ok(())
    }
}
