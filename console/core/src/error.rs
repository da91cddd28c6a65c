//! Error Types
//!
//! Store failures never reach the agent as hard errors; the console logs
//! them and raises a degraded indicator. `ConsoleError` covers the few
//! conditions a caller has to handle.

use thiserror::Error;

use crate::status::AgentStatus;

/// Errors from a [`CallStore`](crate::store::CallStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("store returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        body: String,
    },

    /// The response body could not be decoded
    #[error("could not decode store response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The record to update does not exist
    #[error("record not found: {0}")]
    NotFound(String),

    /// The store is not reachable (used by offline and test stores)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the [`Console`](crate::Console)
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The status can only be entered programmatically
    #[error("{0} cannot be selected from the status menu")]
    NotSelectable(AgentStatus),

    /// The background store worker has exited
    #[error("store worker stopped")]
    WorkerStopped,
}
