use crate::bag::StateBag;
use anyhow::Result;
use bytes::Bytes;

/// Converts a state bag to and from an opaque byte representation.
///
/// The runtime treats the byte layout as opaque: a bag is encoded once on save
/// and decoded on restore, and the bytes are further text-encoded before they
/// reach the string-keyed durable store.
pub trait StateCodec: Send + Sync + 'static {
    fn encode(&self, bag: &StateBag) -> Result<Bytes>;

    fn decode(&self, bytes: Bytes) -> Result<StateBag>;
}
