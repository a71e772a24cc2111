//! Subscriber trait for finished-transaction notifications
//!
//! The [`Subscriber`] trait is the interface through which downstream
//! consumers (statistics, trace shipping, test harnesses) observe finished
//! transactions. The lifecycle manager notifies every registered subscriber,
//! in registration order, each time a transaction finalizes.

use crate::transaction::FinalizedTransaction;
use async_trait::async_trait;
use std::sync::Arc;
use vahti_core::AgentError;

/// Subscriber - observes finished transactions
///
/// # Implementation Requirements
///
/// - Subscribers must be `Send + Sync`; they are shared across request tasks
/// - Handlers receive the finalized transaction as a shared `Arc`; the views
///   are frozen, and the transaction is dropped once every subscriber has
///   released its clone
/// - A returned error is logged by the lifecycle manager and never prevents
///   other subscribers from being notified
///
/// # Example
///
/// ```ignore
/// use vahti_agent::{FinalizedTransaction, Subscriber};
/// use async_trait::async_trait;
/// use vahti_core::AgentError;
///
/// struct ApdexSubscriber {
///     apdex_t: std::time::Duration,
/// }
///
/// #[async_trait]
/// impl Subscriber for ApdexSubscriber {
///     fn name(&self) -> &'static str {
///         "apdex"
///     }
///
///     async fn transaction_finished(
///         &self,
///         transaction: Arc<FinalizedTransaction>,
///     ) -> Result<(), AgentError> {
///         let satisfying = transaction.duration() <= self.apdex_t;
///         // record into the stats engine...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Returns the subscriber's name for identification and logging
    fn name(&self) -> &'static str;

    /// Observe a finished transaction
    ///
    /// Called once per finalized transaction, after the attribute views are
    /// frozen. Returning an error marks this subscriber's delivery failed;
    /// it is isolated from the others.
    async fn transaction_finished(
        &self,
        transaction: Arc<FinalizedTransaction>,
    ) -> Result<(), AgentError>;
}
