//! Length-prefixed recursive binary codec for state bags.
//!
//! Layout, all integers little-endian:
//!
//! - bag: `u32` entry count, then per entry a length-prefixed UTF-8 key
//!   followed by a value.
//! - value: `u8` tag, then the payload: bool as `u8`, int as `i64`, float as
//!   `f64`, text/blob as `u32` length plus bytes, nested bags recursively,
//!   wrapped values as a kind string plus a length-prefixed payload.
//!
//! Strict on both sides: encoding rejects payloads whose length does not fit
//! the `u32` prefix, and decoding errors on truncated input, unknown tags,
//! invalid UTF-8, and trailing bytes. The runtime maps any codec error to
//! record-not-available.

use anyhow::{bail, Context, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use rehydrate_core::{StateBag, StateCodec, StateValue, WrappedValue};

const TAG_BOOL: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_FLOAT: u8 = 2;
const TAG_TEXT: u8 = 3;
const TAG_BLOB: u8 = 4;
const TAG_BAG: u8 = 5;
const TAG_WRAPPED: u8 = 6;

/// Binary codec for state bags. The default codec for [`Bridge`](crate::Bridge).
pub struct RecordCodec;

impl StateCodec for RecordCodec {
    fn encode(&self, bag: &StateBag) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        write_bag(&mut buf, bag)?;
        Ok(buf.freeze())
    }

    fn decode(&self, bytes: Bytes) -> Result<StateBag> {
        let mut cursor = bytes;
        let bag = read_bag(&mut cursor)?;
        if cursor.has_remaining() {
            bail!(
                "record codec: {} trailing bytes after bag",
                cursor.remaining()
            );
        }
        Ok(bag)
    }
}

fn write_len(buf: &mut BytesMut, len: usize) -> Result<()> {
    let len = u32::try_from(len).context("record codec: length exceeds u32 prefix")?;
    buf.put_u32_le(len);
    Ok(())
}

fn write_bag(buf: &mut BytesMut, bag: &StateBag) -> Result<()> {
    write_len(buf, bag.len())?;
    for (key, value) in bag.iter() {
        write_str(buf, key)?;
        write_value(buf, value)?;
    }
    Ok(())
}

fn write_str(buf: &mut BytesMut, s: &str) -> Result<()> {
    write_len(buf, s.len())?;
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn write_bytes(buf: &mut BytesMut, b: &[u8]) -> Result<()> {
    write_len(buf, b.len())?;
    buf.put_slice(b);
    Ok(())
}

fn write_value(buf: &mut BytesMut, value: &StateValue) -> Result<()> {
    match value {
        StateValue::Bool(v) => {
            buf.put_u8(TAG_BOOL);
            buf.put_u8(u8::from(*v));
        }
        StateValue::Int(v) => {
            buf.put_u8(TAG_INT);
            buf.put_i64_le(*v);
        }
        StateValue::Float(v) => {
            buf.put_u8(TAG_FLOAT);
            buf.put_f64_le(*v);
        }
        StateValue::Text(v) => {
            buf.put_u8(TAG_TEXT);
            write_str(buf, v)?;
        }
        StateValue::Blob(v) => {
            buf.put_u8(TAG_BLOB);
            write_bytes(buf, v)?;
        }
        StateValue::Bag(v) => {
            buf.put_u8(TAG_BAG);
            write_bag(buf, v)?;
        }
        StateValue::Wrapped(v) => {
            buf.put_u8(TAG_WRAPPED);
            write_str(buf, &v.kind)?;
            write_bytes(buf, &v.payload)?;
        }
    }
    Ok(())
}

fn need(cursor: &Bytes, n: usize) -> Result<()> {
    if cursor.remaining() < n {
        bail!("record codec: truncated input");
    }
    Ok(())
}

fn read_u8(cursor: &mut Bytes) -> Result<u8> {
    need(cursor, 1)?;
    Ok(cursor.get_u8())
}

fn read_u32(cursor: &mut Bytes) -> Result<u32> {
    need(cursor, 4)?;
    Ok(cursor.get_u32_le())
}

fn read_bytes(cursor: &mut Bytes) -> Result<Vec<u8>> {
    let len = read_u32(cursor)? as usize;
    need(cursor, len)?;
    Ok(cursor.copy_to_bytes(len).to_vec())
}

fn read_str(cursor: &mut Bytes) -> Result<String> {
    String::from_utf8(read_bytes(cursor)?).context("record codec: invalid UTF-8")
}

fn read_bag(cursor: &mut Bytes) -> Result<StateBag> {
    let count = read_u32(cursor)?;
    let mut bag = StateBag::new();
    for _ in 0..count {
        let key = read_str(cursor)?;
        let value = read_value(cursor)?;
        bag.insert(key, value);
    }
    Ok(bag)
}

fn read_value(cursor: &mut Bytes) -> Result<StateValue> {
    let tag = read_u8(cursor)?;
    let value = match tag {
        TAG_BOOL => StateValue::Bool(read_u8(cursor)? != 0),
        TAG_INT => {
            need(cursor, 8)?;
            StateValue::Int(cursor.get_i64_le())
        }
        TAG_FLOAT => {
            need(cursor, 8)?;
            StateValue::Float(cursor.get_f64_le())
        }
        TAG_TEXT => StateValue::Text(read_str(cursor)?),
        TAG_BLOB => StateValue::Blob(read_bytes(cursor)?),
        TAG_BAG => StateValue::Bag(read_bag(cursor)?),
        TAG_WRAPPED => StateValue::Wrapped(WrappedValue {
            kind: read_str(cursor)?,
            payload: read_bytes(cursor)?,
        }),
        other => bail!("record codec: unknown value tag {}", other),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bag() -> StateBag {
        let mut child = StateBag::new();
        child.put_float("ratio", -1.25);
        child.put_blob("raw", vec![0, 255, 7]);

        let mut bag = StateBag::new();
        bag.put_text("name", "screen");
        bag.put_bool("visible", false);
        bag.put_int("count", i64::MIN);
        bag.put_bag("child", child);
        bag.insert(
            "wrapped",
            StateValue::Wrapped(WrappedValue {
                kind: "image".to_string(),
                payload: vec![9, 8, 7],
            }),
        );
        bag
    }

    #[test]
    fn test_round_trip() {
        let bag = sample_bag();
        let codec = RecordCodec;
        let bytes = codec.encode(&bag).unwrap();
        let decoded = codec.decode(bytes).unwrap();
        assert_eq!(decoded, bag);
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let codec = RecordCodec;
        let bytes = codec.encode(&sample_bag()).unwrap();
        let decoded = codec.decode(bytes).unwrap();
        let keys: Vec<_> = decoded.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["name", "visible", "count", "child", "wrapped"]);
    }

    #[test]
    fn test_empty_bag() {
        let codec = RecordCodec;
        let bytes = codec.encode(&StateBag::new()).unwrap();
        let decoded = codec.decode(bytes).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        let codec = RecordCodec;
        let bytes = codec.encode(&sample_bag()).unwrap();
        let truncated = bytes.slice(0..bytes.len() - 1);
        assert!(codec.decode(truncated).is_err());
        assert!(codec.decode(Bytes::from_static(&[1, 0])).is_err());
    }

    #[test]
    fn test_oversized_length_is_an_error() {
        // Lengths that do not fit the u32 prefix must fail instead of
        // truncating into a corrupt record. Only reachable on 64-bit targets.
        if let Some(oversized) = (u32::MAX as usize).checked_add(1) {
            assert!(write_len(&mut BytesMut::new(), oversized).is_err());
        }
        assert!(write_len(&mut BytesMut::new(), u32::MAX as usize).is_ok());
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        // One entry, one-byte key "k", tag 200.
        let raw: &[u8] = &[1, 0, 0, 0, 1, 0, 0, 0, b'k', 200];
        let codec = RecordCodec;
        assert!(codec.decode(Bytes::copy_from_slice(raw)).is_err());
    }

    #[test]
    fn test_trailing_bytes_are_an_error() {
        let codec = RecordCodec;
        let mut raw = codec.encode(&StateBag::new()).unwrap().to_vec();
        raw.push(0);
        assert!(codec.decode(Bytes::from(raw)).is_err());
    }
}
