//! Error types for the Vahti agent

use thiserror::Error;

/// Error type for agent operations
///
/// All failures inside the collection/filtering path are contained per
/// request: a failed write never aborts other writes and never fails the
/// request being monitored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// A write landed on a finalized transaction
    ///
    /// Programming error in the calling adapter. The value is dropped and
    /// logged; the frozen attribute view is never touched.
    #[error("transaction already finalized, dropped write for '{key}'")]
    FinalizedTransaction {
        /// Key of the attribute whose write was dropped
        key: String,
    },

    /// Malformed configuration
    ///
    /// Raised at config-load time (bad include/exclude pattern, unknown
    /// destination name), never during request handling.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subscriber's transaction-finished handler failed
    ///
    /// Isolated per subscriber: the lifecycle manager logs it and keeps
    /// notifying the remaining subscribers.
    #[error("subscriber '{subscriber}' failed: {message}")]
    Subscriber {
        /// Name of the failing subscriber
        subscriber: String,
        /// What went wrong
        message: String,
    },
}
