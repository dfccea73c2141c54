//! Durable store boundary for rehydrate.
//!
//! This crate provides the trait the runtime persists through, plus two
//! implementations.
//!
//! # Architecture
//!
//! - **DurableStore**: a process-wide, crash-durable string key-value store.
//!   The runtime produces only two key shapes (`bundle_<id>` records and the
//!   `uuid_<type>` keys stamped into carriers, which never reach the store);
//!   values are opaque text.
//! - **InMemoryStore**: a HashMap-backed reference implementation, suitable
//!   for tests and for hosts that only need process-lifetime persistence.
//! - **FileStore**: a directory-backed implementation with one file per key
//!   and atomic writes.
//!
//! # Implementing custom stores
//!
//! A host with its own key-value facility (settings database, platform
//! preferences, etc.) implements [`DurableStore`] over it:
//!
//! ```rust,ignore
//! use rehydrate_persistence::{DurableStore, StoreError};
//!
//! pub struct PrefsStore { /* your handle */ }
//!
//! impl DurableStore for PrefsStore {
//!     fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
//!         // read from the platform store
//!     }
//!     // ... put, remove, clear
//! }
//! ```

mod file;
mod in_memory;
mod store;

pub use file::FileStore;
pub use in_memory::InMemoryStore;
pub use store::{DurableStore, StoreError};
