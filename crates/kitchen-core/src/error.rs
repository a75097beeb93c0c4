//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type shared by every bounded context.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate stream has no events.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// An entity inside an aggregate (section, proposal, image) is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller's role or ownership does not permit the operation.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// Signed upload target issuance failed.
    #[error("upload error: {0}")]
    Upload(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for a missing entity of the given kind.
    #[must_use]
    pub fn not_found(kind: &str, id: Uuid) -> Self {
        Self::NotFound(format!("{kind} {id}"))
    }
}
