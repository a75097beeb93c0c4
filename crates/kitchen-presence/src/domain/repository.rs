//! Presence persistence seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kitchen_core::error::DomainError;
use uuid::Uuid;

use super::presence::{PresenceRecord, PresenceStatus};

/// Upsert-only storage for presence rows. Presence is not event-sourced:
/// only the latest heartbeat of each (project, user) pair matters.
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// Records a heartbeat. An existing row gets `last_seen_at` and, when
    /// given, `status` and `display_name`; a new row starts as `status` or
    /// `not_participating`.
    async fn upsert(
        &self,
        project_id: Uuid,
        user_id: &str,
        status: Option<PresenceStatus>,
        display_name: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<PresenceRecord, DomainError>;

    /// Every row of `project_id`, stale or not.
    async fn list_for_project(&self, project_id: Uuid)
    -> Result<Vec<PresenceRecord>, DomainError>;
}
