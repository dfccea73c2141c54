//! Identity tracking and two-tier state persistence for transient targets.
//!
//! Rehydrate lets application objects (screens, controllers) preserve a
//! [`StateBag`] across their destruction/recreation cycle, including recreation
//! after the hosting process is killed, without their owners persisting
//! anything by hand.
//!
//! # Architecture
//!
//! - **[`Bridge`]**: the façade hosts call. `save` allocates a stable
//!   identifier for the target, stamps it into the caller's carrier bag, and
//!   stores the target's state; `restore` recovers the identifier from the
//!   carrier, delivers the bag exactly once, and deletes it.
//! - **[`IdentityRegistry`]**: weak instance-to-identifier map; never keeps a
//!   target alive.
//! - **[`StateCache`]**: in-memory bags with synchronous write-through to a
//!   [`DurableStore`](rehydrate_persistence::DurableStore), text-encoded via a
//!   [`StateCodec`](rehydrate_core::StateCodec) plus base64.
//! - **[`LifecycleGate`]**: decides from host container events whether
//!   destruction-triggered clearing is currently safe, and whether a brand-new
//!   process run should wipe stale durable records.
//!
//! # Example
//!
//! ```rust,ignore
//! use rehydrate_runtime::{Bridge, LifecycleObserver};
//! use rehydrate_persistence::FileStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(FileStore::open("/data/rehydrate")?);
//! let bridge = Bridge::new(store);
//!
//! // Host lifecycle plumbing:
//! bridge.on_container_created(saved_carrier.is_some());
//!
//! // In the target's save path:
//! bridge.save(&screen, &mut carrier);
//!
//! // In a fresh instance's restore path:
//! bridge.restore(&new_screen, Some(&carrier));
//! ```

pub mod serialization;

mod bridge;
mod cache;
mod lifecycle;
mod registry;

pub use bridge::{Bridge, LifecycleObserver};
pub use cache::StateCache;
pub use lifecycle::LifecycleGate;
pub use registry::IdentityRegistry;

pub use rehydrate_core::{
    BagTransform, NoopTransform, SavedState, StateBag, StateCodec, StateValue, TargetId,
    WrappedValue,
};
pub use rehydrate_persistence as persistence;
