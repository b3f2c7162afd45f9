//! Error types for the rollout-plan store.

use thiserror::Error;

/// Result type alias for plan store operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors that can occur during plan store operations.
///
/// `Duplicate`, `NotFound`, and `Malformed` are locally recoverable — the
/// caller may retry with corrected input. The storage variants surface redb
/// faults.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to open plan store: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("duplicate rollout plan: {0}")]
    Duplicate(String),

    #[error("no rollout plan named: {0}")]
    NotFound(String),

    #[error("malformed rollout plan content: {0}")]
    Malformed(String),
}
