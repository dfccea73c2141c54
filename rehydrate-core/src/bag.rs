//! Ordered, typed key-value container for a single target's saved state.
//!
//! A bag preserves insertion order and may nest other bags. Values are a small
//! tagged union; byte payloads use `serde_bytes` so codecs can treat them as
//! raw bytes rather than element sequences.

use serde::{Deserialize, Serialize};

/// A single value stored in a [`StateBag`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(#[serde(with = "serde_bytes")] Vec<u8>),
    Bag(StateBag),
    /// A value pre-processed by a [`BagTransform`](crate::transform::BagTransform).
    /// The core never interprets the payload; `kind` tells the transform that
    /// produced it how to reverse the wrapping.
    Wrapped(WrappedValue),
}

/// An opaque wrapped payload produced by a bag transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedValue {
    pub kind: String,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

/// Ordered mapping from string key to [`StateValue`].
///
/// Inserting under an existing key replaces the value in place, keeping the
/// key's original position. Bags are expected to stay small; lookups are
/// linear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateBag {
    entries: Vec<(String, StateValue)>,
}

impl StateBag {
    /// Create a new empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert a value, replacing any existing value for `key` in place.
    pub fn insert(&mut self, key: impl Into<String>, value: StateValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Get the value for `key`, or `None` if absent.
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Remove and return the value for `key`, or `None` if absent.
    pub fn remove(&mut self, key: &str) -> Option<StateValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate values mutably, in insertion order. Used by bag transforms.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut StateValue> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) {
        self.insert(key, StateValue::Bool(value));
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i64) {
        self.insert(key, StateValue::Int(value));
    }

    pub fn put_float(&mut self, key: impl Into<String>, value: f64) {
        self.insert(key, StateValue::Float(value));
    }

    pub fn put_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, StateValue::Text(value.into()));
    }

    pub fn put_blob(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.insert(key, StateValue::Blob(value));
    }

    pub fn put_bag(&mut self, key: impl Into<String>, value: StateBag) {
        self.insert(key, StateValue::Bag(value));
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(StateValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(StateValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(StateValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(StateValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn get_blob(&self, key: &str) -> Option<&[u8]> {
        match self.get(key) {
            Some(StateValue::Blob(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn get_bag(&self, key: &str) -> Option<&StateBag> {
        match self.get(key) {
            Some(StateValue::Bag(v)) => Some(v),
            _ => None,
        }
    }
}
