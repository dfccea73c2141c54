//! In-memory state cache with write-through to the durable store.
//!
//! `put` writes both tiers synchronously; `get` prefers memory and falls back
//! to decoding the durable record on a miss without repopulating memory, so a
//! record read from disk is decoded fresh each time until it is consumed.
//! Store and decode failures degrade to absence and are logged, never
//! surfaced.

use base64::engine::general_purpose;
use base64::Engine as _;
use bytes::Bytes;
use rehydrate_core::{StateBag, StateCodec, TargetId};
use rehydrate_persistence::DurableStore;
use std::collections::HashMap;
use std::sync::Arc;

pub struct StateCache {
    bags: HashMap<TargetId, StateBag>,
    store: Arc<dyn DurableStore>,
    codec: Arc<dyn StateCodec>,
}

fn record_key(id: &TargetId) -> String {
    format!("bundle_{}", id)
}

impl StateCache {
    pub fn new(store: Arc<dyn DurableStore>, codec: Arc<dyn StateCodec>) -> Self {
        Self {
            bags: HashMap::new(),
            store,
            codec,
        }
    }

    /// Store `bag` under `id` in memory and on disk, overwriting any prior
    /// state for that identifier in both tiers.
    pub fn put(&mut self, id: &TargetId, bag: StateBag) {
        match self.encode(&bag) {
            Ok(encoded) => {
                if let Err(e) = self.store.put(&record_key(id), &encoded) {
                    tracing::warn!(id = %id, error = %e, "failed to persist state record");
                }
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "failed to encode state bag");
            }
        }
        self.bags.insert(id.clone(), bag);
    }

    /// Fetch the bag for `id`: memory first, then the durable record.
    pub fn get(&self, id: &TargetId) -> Option<StateBag> {
        if let Some(bag) = self.bags.get(id) {
            return Some(bag.clone());
        }
        self.read_from_store(id)
    }

    /// Delete the state for `id` from both tiers.
    pub fn remove(&mut self, id: &TargetId) {
        self.bags.remove(id);
        if let Err(e) = self.store.remove(&record_key(id)) {
            tracing::warn!(id = %id, error = %e, "failed to remove state record");
        }
    }

    /// Drop the in-memory tier only. The durable store is cleared separately.
    pub fn clear_memory(&mut self) {
        self.bags.clear();
    }

    fn encode(&self, bag: &StateBag) -> anyhow::Result<String> {
        let bytes = self.codec.encode(bag)?;
        Ok(general_purpose::STANDARD.encode(&bytes))
    }

    fn read_from_store(&self, id: &TargetId) -> Option<StateBag> {
        let encoded = match self.store.get(&record_key(id)) {
            Ok(value) => value?,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "failed to read state record");
                return None;
            }
        };
        let bytes = match general_purpose::STANDARD.decode(&encoded) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "state record is not valid base64");
                return None;
            }
        };
        match self.codec.decode(Bytes::from(bytes)) {
            Ok(bag) => Some(bag),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "failed to decode state record");
                None
            }
        }
    }
}
