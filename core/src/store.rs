//! The attribute store - an ordered, key-unique container
//!
//! One store belongs to one transaction. Instrumentation callbacks write
//! into it as the request progresses (route matched, query parsed, response
//! flushed); the filter engine reads per-destination snapshots out of it at
//! finalize time.
//!
//! # Last-write-wins
//!
//! Each key maps to exactly one current value. A later `set` for the same
//! key overwrites the earlier value and replaces (not unions) its
//! destination set. This is how query parameters mask route parameters that
//! share a name: the adapter records route params first, query params after,
//! and the store keeps only the final value. No history is retained.

use crate::destination::{Destination, DestinationSet};
use crate::value::AttributeValue;
use std::collections::HashMap;

/// A single recorded attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Namespaced key (`request.method`) or bare parameter name (`id`)
    pub key: String,
    /// Current value; later writes overwrite earlier ones
    pub value: AttributeValue,
    /// Destinations allowed to see this attribute
    pub destinations: DestinationSet,
}

/// Ordered, key-unique attribute container
///
/// Writes never fail. Attribute counts are small (a dozen or two per
/// request), so entries live in a plain `Vec` scanned linearly; an
/// overwritten key keeps its original position.
///
/// # Example
///
/// ```
/// use vahti_core::{AttributeStore, Destination, DestinationSet};
///
/// let mut store = AttributeStore::new();
/// let tracer = DestinationSet::from(Destination::TransactionTracer);
/// store.set("id", "5", tracer.clone());
/// store.set("id", "6", tracer);
///
/// assert_eq!(store.get("id").and_then(|v| v.as_str()), Some("6"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    entries: Vec<Attribute>,
}

impl AttributeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the value for `key`
    ///
    /// The new destination set replaces any prior association for the key.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
        destinations: DestinationSet,
    ) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.value = value;
                entry.destinations = destinations;
            }
            None => self.entries.push(Attribute {
                key,
                value,
                destinations,
            }),
        }
    }

    /// Get the current value for `key`
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// All keys destined for `destination`, with their current values
    ///
    /// A destination no attribute was recorded for yields an empty map, not
    /// an error.
    pub fn snapshot(&self, destination: Destination) -> HashMap<String, AttributeValue> {
        self.entries
            .iter()
            .filter(|e| e.destinations.contains(destination))
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect()
    }

    /// Iterate recorded attributes in first-write order
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    /// Number of distinct keys recorded
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
