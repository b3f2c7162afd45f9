//! Error types for the domain controller.

use thiserror::Error;

use tiller_plans::PlanError;

/// Result type alias for domain controller operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Errors that can occur in the domain controller.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("host '{0}' is already registered")]
    DuplicateHost(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Plans(#[from] PlanError),
}
