//! Event repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;

/// Stored representation of a domain event.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Sequence number within the aggregate stream.
    pub sequence_number: i64,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing event/command.
    pub causation_id: Uuid,
    /// User the change is attributed to.
    pub recorded_by: String,
    /// Timestamp of event creation.
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

/// Repository trait for loading and appending domain events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Load all events for a given aggregate, ordered by sequence number.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    /// `expected_version` is the last known sequence number. The whole slice
    /// is appended atomically or not at all.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError>;
}

/// Attempts a retried write gets before its conflict is returned.
pub const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Re-runs `write` while it loses the append race to another writer of the
/// same stream, at most [`MAX_WRITE_ATTEMPTS`] times.
///
/// `write` must load the aggregate afresh on every call so the command is
/// re-applied on top of whatever landed in between. Only commands that do
/// not depend on the state the caller saw belong here; structural edits let
/// the conflict surface.
///
/// # Errors
///
/// Returns the last `DomainError::ConcurrencyConflict` once the attempts are
/// used up, and any other error from `write` immediately.
pub async fn retry_on_conflict<T, F, Fut>(mut write: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, DomainError>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Err(DomainError::ConcurrencyConflict { .. }) if attempt < MAX_WRITE_ATTEMPTS => {
                attempt += 1;
            }
            result => return result,
        }
    }
}
