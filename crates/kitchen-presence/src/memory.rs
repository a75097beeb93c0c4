//! In-process presence storage.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kitchen_core::error::DomainError;
use kitchen_core::identity::DisplayNameResolver;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::presence::{PresenceRecord, PresenceStatus};
use crate::domain::repository::PresenceRepository;

/// Presence rows kept in memory, keyed by (project, user).
#[derive(Debug, Default)]
pub struct InMemoryPresenceRepository {
    rows: RwLock<HashMap<(Uuid, String), PresenceRecord>>,
}

impl InMemoryPresenceRepository {
    /// An empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceRepository for InMemoryPresenceRepository {
    async fn upsert(
        &self,
        project_id: Uuid,
        user_id: &str,
        status: Option<PresenceStatus>,
        display_name: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<PresenceRecord, DomainError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .entry((project_id, user_id.to_owned()))
            .or_insert_with(|| PresenceRecord {
                project_id,
                user_id: user_id.to_owned(),
                status: PresenceStatus::default(),
                display_name: None,
                last_seen_at: seen_at,
            });
        row.last_seen_at = seen_at;
        if let Some(status) = status {
            row.status = status;
        }
        if let Some(name) = display_name {
            row.display_name = Some(name.to_owned());
        }
        Ok(row.clone())
    }

    async fn list_for_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<PresenceRecord>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|row| row.project_id == project_id)
            .cloned()
            .collect())
    }
}

/// Names come from each user's most recently seen named row.
#[async_trait]
impl DisplayNameResolver for InMemoryPresenceRepository {
    async fn resolve_display_names(
        &self,
        user_ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>, DomainError> {
        let rows = self.rows.read().await;
        let mut latest: HashMap<&str, &PresenceRecord> = HashMap::new();
        for row in rows.values() {
            if row.display_name.is_none() || !user_ids.contains(&row.user_id) {
                continue;
            }
            let newer = latest
                .get(row.user_id.as_str())
                .is_none_or(|seen| seen.last_seen_at < row.last_seen_at);
            if newer {
                latest.insert(&row.user_id, row);
            }
        }
        Ok(latest
            .into_iter()
            .filter_map(|(user_id, row)| {
                row.display_name
                    .clone()
                    .map(|name| (user_id.to_owned(), name))
            })
            .collect())
    }
}
