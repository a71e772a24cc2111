//! The transaction - per-request attribute aggregate
//!
//! One transaction is created per monitored request. Instrumentation
//! callbacks record attributes into it in a well-defined sequential order
//! (route matched, query parsed, response flushed), then the lifecycle
//! manager finalizes it: the filter engine runs once per destination and the
//! resulting views are frozen. `ACTIVE -> FINALIZED` is one-way; writes after
//! finalization are dropped with an error and never touch the frozen views.

use crate::config::AgentConfig;
use crate::filter::FilterEngine;
use crate::http::{RequestMetadata, ResponseMetadata};
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use ulid::Ulid;
use vahti_core::{keys, AgentError, AttributeStore, AttributeValue, Destination, DestinationSet};

/// Per-request aggregate of timing and attribute data
///
/// Owned exclusively by the lifecycle manager while active; after
/// [`finalize`](Transaction::finalize) the result is immutable and shared
/// with subscribers via `Arc`.
#[derive(Debug)]
pub struct Transaction {
    id: Ulid,
    started_at: DateTime<Utc>,
    start: Instant,
    config: Arc<AgentConfig>,
    store: AttributeStore,
    finalized: Option<Arc<FinalizedTransaction>>,
}

impl Transaction {
    /// Create an active transaction under the given configuration
    pub fn new(config: Arc<AgentConfig>) -> Self {
        Self {
            id: Ulid::new(),
            started_at: Utc::now(),
            start: Instant::now(),
            config,
            store: AttributeStore::new(),
            finalized: None,
        }
    }

    /// Unique transaction id
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Wall-clock start time
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the transaction has been finalized
    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Direct read access to the raw store (pre-filtering)
    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    fn guard_active(&self, key: &str) -> Result<()> {
        if self.finalized.is_some() {
            warn!(id = %self.id, key, "Write on finalized transaction dropped");
            return Err(AgentError::FinalizedTransaction {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn metadata_destinations() -> DestinationSet {
        DestinationSet::from(Destination::TransactionTracer)
            .with(Destination::TransactionEvents)
    }

    /// Record request-side metadata as soon as method/URI/headers are known
    ///
    /// Writes `request.method`, `request.headers.host` (when the request
    /// carries a Host header), and `request.uri` only when
    /// `send_request_uri_attribute` is enabled.
    pub fn record_request_metadata(&mut self, request: &RequestMetadata) -> Result<()> {
        self.guard_active(keys::REQUEST_METHOD)?;
        let destinations = Self::metadata_destinations();

        self.store
            .set(keys::REQUEST_METHOD, request.method(), destinations.clone());
        if let Some(host) = request.header("host") {
            self.store
                .set(keys::REQUEST_HEADERS_HOST, host, destinations.clone());
        }
        if self.config.send_request_uri_attribute {
            self.store.set(keys::REQUEST_URI, request.uri(), destinations);
        }
        Ok(())
    }

    /// Record a named route segment (`/user/:id` matched as `id`)
    ///
    /// Adapters must record all route params before any query param so that
    /// the store's last-write-wins overwrite gives query params precedence
    /// on shared names.
    pub fn record_route_param(&mut self, name: &str, value: impl Into<AttributeValue>) -> Result<()> {
        self.guard_active(name)?;
        self.store
            .set(name, value, DestinationSet::from(Destination::TransactionTracer));
        Ok(())
    }

    /// Record a parsed query parameter
    ///
    /// Recorded after route params by the adapter contract; a query param
    /// sharing a route param's name masks it.
    pub fn record_query_param(&mut self, name: &str, value: impl Into<AttributeValue>) -> Result<()> {
        self.guard_active(name)?;
        self.store
            .set(name, value, DestinationSet::from(Destination::TransactionTracer));
        Ok(())
    }

    /// Record response-side metadata when the response completes
    ///
    /// Writes `response.status` (numeric) and `httpResponseCode` (string
    /// form) always; `httpResponseMessage` only when the transport supplied
    /// one; the contentLength/contentType attributes only when those headers
    /// are present.
    pub fn record_response_metadata(&mut self, response: &ResponseMetadata) -> Result<()> {
        self.guard_active(keys::RESPONSE_STATUS)?;
        let destinations = Self::metadata_destinations();

        self.store
            .set(keys::RESPONSE_STATUS, response.status(), destinations.clone());
        self.store.set(
            keys::HTTP_RESPONSE_CODE,
            response.status().to_string(),
            destinations.clone(),
        );
        if let Some(message) = response.status_message() {
            self.store
                .set(keys::HTTP_RESPONSE_MESSAGE, message, destinations.clone());
        }
        if let Some(length) = response.header("content-length") {
            self.store
                .set(keys::RESPONSE_CONTENT_LENGTH, length, destinations.clone());
        }
        if let Some(content_type) = response.header("content-type") {
            self.store
                .set(keys::RESPONSE_CONTENT_TYPE, content_type, destinations);
        }
        Ok(())
    }

    /// Transition `ACTIVE -> FINALIZED`, filtering the store per destination
    ///
    /// Idempotent: the first call freezes the views and memoizes the result;
    /// later calls return the same `Arc` without re-filtering.
    pub fn finalize(&mut self, filter: &FilterEngine) -> Arc<FinalizedTransaction> {
        if let Some(finished) = &self.finalized {
            return Arc::clone(finished);
        }

        let mut views = HashMap::new();
        for destination in Destination::ALL {
            let raw = self.store.snapshot(destination);
            views.insert(destination, filter.filter(&raw, destination));
        }

        let finished = Arc::new(FinalizedTransaction {
            id: self.id,
            started_at: self.started_at,
            duration: self.start.elapsed(),
            trace: Trace {
                attributes: TraceAttributes { views },
            },
        });
        debug!(
            id = %self.id,
            duration_us = finished.duration.as_micros() as u64,
            attributes = self.store.len(),
            "Transaction finalized"
        );
        self.finalized = Some(Arc::clone(&finished));
        finished
    }
}

/// An immutable, filtered, shareable finished transaction
#[derive(Debug)]
pub struct FinalizedTransaction {
    id: Ulid,
    started_at: DateTime<Utc>,
    duration: Duration,
    trace: Trace,
}

impl FinalizedTransaction {
    /// Transaction id
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Wall-clock start time
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Elapsed time from begin to finalize
    ///
    /// The statistics subscriber reads this against the configured `apdex_t`
    /// threshold; the engine itself computes no apdex.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The detailed trace view
    pub fn trace(&self) -> &Trace {
        &self.trace
    }
}

/// Trace data attached to a finished transaction
#[derive(Debug)]
pub struct Trace {
    attributes: TraceAttributes,
}

impl Trace {
    /// The filtered attribute views
    pub fn attributes(&self) -> &TraceAttributes {
        &self.attributes
    }
}

/// Frozen per-destination attribute views
///
/// The sole externally consumed query surface of a finished transaction.
#[derive(Debug)]
pub struct TraceAttributes {
    views: HashMap<Destination, HashMap<String, AttributeValue>>,
}

impl TraceAttributes {
    /// The filtered view for one destination
    ///
    /// A destination with nothing admitted yields an empty map.
    pub fn get(&self, destination: Destination) -> &HashMap<String, AttributeValue> {
        static EMPTY: OnceLock<HashMap<String, AttributeValue>> = OnceLock::new();
        self.views
            .get(&destination)
            .unwrap_or_else(|| EMPTY.get_or_init(HashMap::new))
    }
}
