//! In-memory implementation of DurableStore.
//!
//! Stores values in a HashMap. Not crash-durable; useful for tests and for
//! hosts that only need persistence across target recreation within one
//! process run.

use crate::store::{DurableStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory store backed by a HashMap.
///
/// Thread-safe and cheaply cloneable; clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DurableStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .read()
            .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
        values.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
        values.clear();
        Ok(())
    }
}
