//! vahti-agent - Transaction attribute collection and filtering engine
//!
//! Vahti watches one HTTP request at a time: the lifecycle manager opens a
//! transaction when the request begins, framework adapters record attributes
//! into it as they become known, and on completion the transaction is
//! finalized through the filter engine and handed to subscribers.
//!
//! ```text
//! request begins ──► Lifecycle::begin() ──► Transaction (ACTIVE)
//!                                               │
//!            adapters record: method, URI, headers, route params,
//!            query params, response status, response headers
//!                                               │
//! response done ──► Lifecycle::end() ──► FilterEngine per destination
//!                                               │
//!                                        FinalizedTransaction ──► Subscribers
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vahti_agent::{AgentConfig, Lifecycle, RequestMetadata, ResponseMetadata};
//!
//! let lifecycle = Lifecycle::new(AgentConfig::default())?.subscriber(StatsSubscriber);
//!
//! let txn = lifecycle.begin();
//! txn.record_request_metadata(&RequestMetadata::new("GET", "/user/5"))?;
//! txn.record_route_param("id", "5")?;
//! txn.record_response_metadata(&ResponseMetadata::new(200))?;
//! let finished = lifecycle.end(&txn).await;
//!
//! let view = finished.trace().attributes().get(Destination::TransactionTracer);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod config;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod subscribe;
pub mod transaction;

pub use config::{AgentConfig, AttributesConfig, DestinationRules};
pub use filter::FilterEngine;
pub use http::{RequestMetadata, ResponseMetadata};
pub use lifecycle::{Lifecycle, TransactionHandle};
pub use subscribe::Subscriber;
pub use transaction::{FinalizedTransaction, Trace, TraceAttributes, Transaction};

// Re-export core types so adapters can depend on a single crate
pub use vahti_core::{
    keys, AgentError, Attribute, AttributeStore, AttributeValue, Destination, DestinationSet,
};

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
