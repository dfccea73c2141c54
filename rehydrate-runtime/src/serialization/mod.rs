mod record;

#[cfg(feature = "json")]
mod json;

pub use record::RecordCodec;

#[cfg(feature = "json")]
pub use json::JsonCodec;

/// Re-export the codec trait from `rehydrate-core`.
pub use rehydrate_core::StateCodec;
