//! Nullable store: thread-safe in-memory storage for testing.

use pledge_staking::{StakingStore, StoreError};
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory staking store for testing.
pub struct NullStakingStore {
    meta: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl NullStakingStore {
    pub fn new() -> Self {
        Self {
            meta: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.meta.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NullStakingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StakingStore for NullStakingStore {
    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let meta = self
            .meta
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(meta.get(key).cloned())
    }

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.meta
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
