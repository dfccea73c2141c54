//! Core data model and collaborator contracts for rehydrate.
//!
//! This crate defines the pieces the runtime orchestrates but does not itself
//! implement storage or orchestration:
//!
//! - **StateBag**: an ordered, typed key-value container holding the state to
//!   preserve for one target.
//! - **TargetId**: the opaque stable token correlating a target instance across
//!   recreation with its persisted bag.
//! - **SavedState**: the capability a target type implements to write its state
//!   into a bag and read it back out.
//! - **StateCodec**: converts a bag to and from an opaque byte representation.
//! - **BagTransform**: optional pre/post-processing applied to a bag around
//!   provider calls.

pub mod bag;
pub mod codec;
pub mod id;
pub mod provider;
pub mod transform;

pub use bag::{StateBag, StateValue, WrappedValue};
pub use codec::StateCodec;
pub use id::TargetId;
pub use provider::SavedState;
pub use transform::{BagTransform, NoopTransform};
