//! Client-side error taxonomy.
//!
//! Coordination-level failures are terminal for the current operation —
//! nothing here is retried beyond the explicitly bounded retry and poll
//! loops in `gateway` and `watcher`.

use std::time::Duration;

use thiserror::Error;

use crate::gateway::ChannelState;

/// Result type alias for client session operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by a client management session.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The channel is not in the state the call requires.
    #[error("management channel unavailable (state: {0:?})")]
    ChannelUnavailable(ChannelState),

    /// The channel did not close after an operation that should close it.
    #[error("channel did not close within {timeout:?}")]
    Timeout { timeout: Duration },

    /// Reconnection gave up after its bounded retry budget.
    #[error("failed to connect to {endpoint} after {attempts} attempts")]
    ConnectFailed { endpoint: String, attempts: u32 },

    /// A wait was cancelled from outside.
    #[error("interrupted while {during}")]
    Interrupted { during: &'static str },

    /// A host registration did not appear within its window.
    #[error("host '{host}' did not register within {timeout:?}")]
    DeadlineExceeded { host: String, timeout: Duration },

    /// A validated response came back with a failed outcome.
    #[error(transparent)]
    Failed(#[from] tiller_model::OperationFailed),

    /// The transport itself faulted.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
