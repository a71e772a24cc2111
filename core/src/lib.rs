//! vahti-core - Core types for the Vahti monitoring agent
//!
//! This crate provides the foundational types shared between the Vahti
//! agent engine and external instrumentation adapters:
//!
//! - [`AttributeValue`] - tagged value type for recorded attributes
//! - [`Destination`] / [`DestinationSet`] - named consumers of attributes
//! - [`AttributeStore`] - ordered, key-unique attribute container
//! - [`AgentError`] - error type for agent operations
//! - [`keys`] - reserved attribute key constants
//!
//! # Why this crate exists
//!
//! Framework adapters (the instrumentation shims that hook a web framework's
//! routing) need the attribute types to record data into a transaction, but
//! they must not depend on the engine's lifecycle machinery. By keeping the
//! shared types here, adapters depend only on `vahti-core`:
//!
//! ```text
//! vahti-core ◄── vahti-agent
//!     ▲
//!     └────────── framework adapters
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

/// Destinations - named consumers of collected attributes
pub mod destination;
mod error;
/// Reserved attribute key constants
pub mod keys;
/// The ordered, key-unique attribute container
pub mod store;
/// The tagged attribute value type
pub mod value;

pub use destination::{Destination, DestinationSet};
pub use error::AgentError;
pub use store::{Attribute, AttributeStore};
pub use value::AttributeValue;
