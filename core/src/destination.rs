//! Destinations - named consumers of collected attributes
//!
//! Each attribute recorded on a transaction carries a set of destinations:
//! the downstream views that are allowed to see it. The detailed trace
//! (`transaction_tracer`) is the primary consumer; the other destinations
//! exist so the filter engine can scope rules per consumer without the
//! store caring who reads what.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// A named consumer of transaction attributes
///
/// Serializes to its snake_case wire name, which is also the key used in
/// configuration (`attributes.destination_rules.transaction_tracer`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// The detailed per-transaction trace view
    TransactionTracer,
    /// Aggregated transaction event records
    TransactionEvents,
    /// Error traces collected alongside failing transactions
    ErrorCollector,
    /// Browser/RUM monitoring payloads
    BrowserMonitoring,
}

impl Destination {
    /// All destinations, in a fixed order
    pub const ALL: [Destination; 4] = [
        Destination::TransactionTracer,
        Destination::TransactionEvents,
        Destination::ErrorCollector,
        Destination::BrowserMonitoring,
    ];

    /// The snake_case wire name for this destination
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::TransactionTracer => "transaction_tracer",
            Destination::TransactionEvents => "transaction_events",
            Destination::ErrorCollector => "error_collector",
            Destination::BrowserMonitoring => "browser_monitoring",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A small ordered set of destinations
///
/// Attribute destination sets are tiny (usually one or two entries), so the
/// set inlines up to all four variants without heap allocation. Insertion
/// order is preserved; duplicate inserts are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationSet(SmallVec<[Destination; 4]>);

impl DestinationSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Add a destination; no-op if already present
    pub fn insert(&mut self, destination: Destination) {
        if !self.0.contains(&destination) {
            self.0.push(destination);
        }
    }

    /// Builder-style insert
    pub fn with(mut self, destination: Destination) -> Self {
        self.insert(destination);
        self
    }

    /// Check membership
    pub fn contains(&self, destination: Destination) -> bool {
        self.0.contains(&destination)
    }

    /// Iterate destinations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = Destination> + '_ {
        self.0.iter().copied()
    }

    /// Number of destinations in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Destination> for DestinationSet {
    fn from(destination: Destination) -> Self {
        Self::new().with(destination)
    }
}

impl FromIterator<Destination> for DestinationSet {
    fn from_iter<I: IntoIterator<Item = Destination>>(iter: I) -> Self {
        let mut set = Self::new();
        for destination in iter {
            set.insert(destination);
        }
        set
    }
}
