//! In-process store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{PersistentStore, StoreError};

/// Keeps values in a map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value under `key`, without going through the async API.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Replace the value under `key`, without going through the async API.
    pub fn insert(&self, key: &str, value: Vec<u8>) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }
}

impl PersistentStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.insert(key, value.to_vec());
        Ok(())
    }
}
