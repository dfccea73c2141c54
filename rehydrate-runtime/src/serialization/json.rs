use anyhow::Result;
use bytes::Bytes;
use rehydrate_core::{StateBag, StateCodec};

/// JSON codec for state bags.
///
/// Human-readable; handy when inspecting durable records during development.
/// [`RecordCodec`](super::RecordCodec) is the default for production use.
pub struct JsonCodec;

impl StateCodec for JsonCodec {
    fn encode(&self, bag: &StateBag) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(bag)?))
    }

    fn decode(&self, bytes: Bytes) -> Result<StateBag> {
        Ok(serde_json::from_slice(&bytes)?)
    }
}
