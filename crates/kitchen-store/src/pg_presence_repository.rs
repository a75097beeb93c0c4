//! `PostgreSQL` implementation of the `PresenceRepository` trait.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kitchen_core::error::DomainError;
use kitchen_core::identity::DisplayNameResolver;
use kitchen_presence::domain::presence::{PresenceRecord, PresenceStatus};
use kitchen_presence::domain::repository::PresenceRepository;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database_error;

#[derive(Debug, sqlx::FromRow)]
struct PresenceRow {
    project_id: Uuid,
    user_id: String,
    status: String,
    display_name: Option<String>,
    last_seen_at: DateTime<Utc>,
}

impl TryFrom<PresenceRow> for PresenceRecord {
    type Error = DomainError;

    fn try_from(row: PresenceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            project_id: row.project_id,
            status: row.status.parse().map_err(|_| {
                DomainError::Infrastructure(format!("corrupt presence status: {}", row.status))
            })?,
            user_id: row.user_id,
            display_name: row.display_name,
            last_seen_at: row.last_seen_at,
        })
    }
}

/// Presence rows in the `presence` table, one per (project, user).
#[derive(Debug, Clone)]
pub struct PgPresenceRepository {
    pool: PgPool,
}

impl PgPresenceRepository {
    /// Creates a new `PgPresenceRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresenceRepository for PgPresenceRepository {
    async fn upsert(
        &self,
        project_id: Uuid,
        user_id: &str,
        status: Option<PresenceStatus>,
        display_name: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<PresenceRecord, DomainError> {
        let row: PresenceRow = sqlx::query_as(
            r"
            INSERT INTO presence (project_id, user_id, status, display_name, last_seen_at)
            VALUES ($1, $2, COALESCE($3::text, 'not_participating'), $4, $5)
            ON CONFLICT (project_id, user_id) DO UPDATE
               SET last_seen_at = EXCLUDED.last_seen_at,
                   status = COALESCE($3::text, presence.status),
                   display_name = COALESCE($4, presence.display_name)
            RETURNING project_id, user_id, status, display_name, last_seen_at
            ",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(status.map(PresenceStatus::as_str))
        .bind(display_name)
        .bind(seen_at)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)?;

        row.try_into()
    }

    async fn list_for_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<PresenceRecord>, DomainError> {
        let rows: Vec<PresenceRow> = sqlx::query_as(
            r"
            SELECT project_id, user_id, status, display_name, last_seen_at
            FROM presence
            WHERE project_id = $1
            ",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(PresenceRecord::try_from).collect()
    }
}

/// Names come from each user's most recently seen named row.
#[async_trait]
impl DisplayNameResolver for PgPresenceRepository {
    async fn resolve_display_names(
        &self,
        user_ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>, DomainError> {
        let wanted: Vec<&str> = user_ids.iter().map(String::as_str).collect();
        let rows: Vec<(String, String)> = sqlx::query_as(
            r"
            SELECT DISTINCT ON (user_id) user_id, display_name
            FROM presence
            WHERE user_id = ANY($1) AND display_name IS NOT NULL
            ORDER BY user_id, last_seen_at DESC
            ",
        )
        .bind(wanted)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.into_iter().collect())
    }
}
