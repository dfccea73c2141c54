//! Durable store trait for persisting encoded state records.

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Store-specific error.
    #[error("Store error: {0}")]
    Backend(String),
}

/// A process-wide, crash-durable string key-value store.
///
/// Implementations must make durability-producing calls complete before
/// returning; the runtime performs no retries. `put` under an existing key
/// overwrites it.
pub trait DurableStore: Send + Sync + 'static {
    /// Read the value for `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, overwriting any existing value.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every key in the store.
    fn clear(&self) -> Result<(), StoreError>;
}
