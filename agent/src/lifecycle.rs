//! The lifecycle manager - begin/current/end for transactions
//!
//! Instrumentation points are scattered across adapters; they cannot thread
//! a transaction reference through every framework callback. The lifecycle
//! manager keeps the "current transaction" as a per-task binding instead of
//! a process-wide slot, so concurrently in-flight requests never observe
//! each other's transaction.
//!
//! ```text
//! begin() ──► TransactionHandle ──► in_scope(handle, request_future)
//!                                        │
//!                       adapters call Lifecycle::current() + record_*
//!                                        │
//! end(&handle).await ──► finalize ──► notify subscribers in order
//! ```

use crate::config::AgentConfig;
use crate::filter::FilterEngine;
use crate::http::{RequestMetadata, ResponseMetadata};
use crate::subscribe::Subscriber;
use crate::transaction::{FinalizedTransaction, Transaction};
use crate::Result;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};
use ulid::Ulid;
use vahti_core::AttributeValue;

tokio::task_local! {
    static CURRENT: TransactionHandle;
}

/// Shared handle to one request's transaction
///
/// Cloning is cheap (`Arc`). Writes within one request arrive from
/// sequentially ordered callbacks, so the mutex is uncontended in practice;
/// it exists to make concurrent `end` calls safe.
#[derive(Clone)]
pub struct TransactionHandle {
    inner: Arc<Mutex<Transaction>>,
}

impl TransactionHandle {
    fn new(transaction: Transaction) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transaction)),
        }
    }

    /// Transaction id
    pub fn id(&self) -> Ulid {
        self.inner.lock().id()
    }

    /// Whether the transaction has been finalized
    pub fn is_finalized(&self) -> bool {
        self.inner.lock().is_finalized()
    }

    /// Record request metadata; see [`Transaction::record_request_metadata`]
    pub fn record_request_metadata(&self, request: &RequestMetadata) -> Result<()> {
        self.inner.lock().record_request_metadata(request)
    }

    /// Record a route parameter; see [`Transaction::record_route_param`]
    pub fn record_route_param(&self, name: &str, value: impl Into<AttributeValue>) -> Result<()> {
        self.inner.lock().record_route_param(name, value)
    }

    /// Record a query parameter; see [`Transaction::record_query_param`]
    pub fn record_query_param(&self, name: &str, value: impl Into<AttributeValue>) -> Result<()> {
        self.inner.lock().record_query_param(name, value)
    }

    /// Record response metadata; see [`Transaction::record_response_metadata`]
    pub fn record_response_metadata(&self, response: &ResponseMetadata) -> Result<()> {
        self.inner.lock().record_response_metadata(response)
    }

    /// Run `f` against the underlying transaction
    pub fn with<R>(&self, f: impl FnOnce(&mut Transaction) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

/// The lifecycle manager
///
/// Built once per agent from a validated config; shared across request tasks
/// behind an `Arc`. Configuration is immutable here - filter rules are
/// compiled at construction, so config changes take effect by building a new
/// manager and apply to subsequently finalized transactions only.
///
/// # Example
///
/// ```ignore
/// let lifecycle = Arc::new(
///     Lifecycle::new(config)?
///         .subscriber(StatsSubscriber::new())
///         .subscriber(TraceShipper::new()),
/// );
///
/// let txn = lifecycle.begin();
/// Lifecycle::in_scope(txn.clone(), handle_request()).await;
/// lifecycle.end(&txn).await;
/// ```
pub struct Lifecycle {
    config: Arc<AgentConfig>,
    filter: FilterEngine,
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl Lifecycle {
    /// Create a lifecycle manager, compiling the config's filter rules
    ///
    /// Fails with `AgentError::Config` on a malformed pattern - at startup,
    /// never during request handling.
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let filter = FilterEngine::new(&config)?;
        info!(
            attributes_enabled = config.attributes.enabled,
            send_request_uri = config.send_request_uri_attribute,
            "Lifecycle manager ready"
        );
        Ok(Self {
            config: Arc::new(config),
            filter,
            subscribers: Vec::new(),
        })
    }

    /// Register a subscriber; notified in registration order
    pub fn subscriber<S: Subscriber + 'static>(mut self, subscriber: S) -> Self {
        self.subscribers.push(Arc::new(subscriber));
        self
    }

    /// Register a subscriber (Arc version)
    pub fn subscriber_arc(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// The configuration this manager was built from
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Create a transaction for a request that just began
    pub fn begin(&self) -> TransactionHandle {
        let handle = TransactionHandle::new(Transaction::new(Arc::clone(&self.config)));
        debug!(id = %handle.id(), "Transaction begun");
        handle
    }

    /// Run a request's future with `handle` installed as the current
    /// transaction for that task
    ///
    /// The binding is scoped to the future: it is visible to everything the
    /// future runs (including `Lifecycle::current()` in adapter callbacks)
    /// and gone once the future completes. Concurrent requests each get
    /// their own binding.
    pub async fn in_scope<F: Future>(handle: TransactionHandle, future: F) -> F::Output {
        CURRENT.scope(handle, future).await
    }

    /// The transaction bound to the calling task, if any
    ///
    /// Returns `None` for work running outside any monitored request.
    pub fn current() -> Option<TransactionHandle> {
        CURRENT.try_with(TransactionHandle::clone).ok()
    }

    /// Finalize the transaction and notify subscribers
    ///
    /// Safe to call concurrently or repeatedly for the same transaction:
    /// finalization happens under the handle's lock and is idempotent, and
    /// only the first caller performs subscriber notification. A failing
    /// subscriber is logged and the remaining subscribers still run.
    pub async fn end(&self, handle: &TransactionHandle) -> Arc<FinalizedTransaction> {
        let (finished, first) = {
            let mut txn = handle.inner.lock();
            let first = !txn.is_finalized();
            (txn.finalize(&self.filter), first)
        };

        if first {
            for subscriber in &self.subscribers {
                if let Err(e) = subscriber.transaction_finished(Arc::clone(&finished)).await {
                    error!(
                        subscriber = subscriber.name(),
                        id = %finished.id(),
                        error = %e,
                        "Subscriber failed, continuing with remaining subscribers"
                    );
                }
            }
        }
        finished
    }
}
