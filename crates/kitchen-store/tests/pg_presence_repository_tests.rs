//! Integration tests for `PgPresenceRepository`.

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use kitchen_core::identity::DisplayNameResolver;
use kitchen_presence::domain::presence::PresenceStatus;
use kitchen_presence::domain::repository::PresenceRepository;
use kitchen_store::pg_presence_repository::PgPresenceRepository;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_first_heartbeat_inserts_default_status(pool: PgPool) {
    let repo = PgPresenceRepository::new(pool);
    let project_id = Uuid::new_v4();

    let record = repo.upsert(project_id, "alice", None, None, Utc::now()).await.unwrap();

    assert_eq!(record.status, PresenceStatus::NotParticipating);
    assert_eq!(record.user_id, "alice");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_upsert_updates_existing_row(pool: PgPool) {
    let repo = PgPresenceRepository::new(pool);
    let project_id = Uuid::new_v4();
    let first = Utc::now() - Duration::seconds(30);
    repo.upsert(project_id, "alice", Some(PresenceStatus::Participating), None, first)
        .await
        .unwrap();

    let later = Utc::now();
    let record = repo.upsert(project_id, "alice", None, None, later).await.unwrap();

    assert_eq!(record.status, PresenceStatus::Participating);
    assert_eq!(record.last_seen_at.timestamp_micros(), later.timestamp_micros());
    assert_eq!(repo.list_for_project(project_id).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_explicit_status_overwrites(pool: PgPool) {
    let repo = PgPresenceRepository::new(pool);
    let project_id = Uuid::new_v4();
    repo.upsert(project_id, "alice", None, None, Utc::now()).await.unwrap();

    let record = repo
        .upsert(project_id, "alice", Some(PresenceStatus::Completed), None, Utc::now())
        .await
        .unwrap();

    assert_eq!(record.status, PresenceStatus::Completed);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_list_is_scoped_to_project(pool: PgPool) {
    let repo = PgPresenceRepository::new(pool);
    let project_id = Uuid::new_v4();
    repo.upsert(project_id, "alice", None, None, Utc::now()).await.unwrap();
    repo.upsert(project_id, "bob", None, None, Utc::now()).await.unwrap();
    repo.upsert(Uuid::new_v4(), "carol", None, None, Utc::now()).await.unwrap();

    let rows = repo.list_for_project(project_id).await.unwrap();

    assert_eq!(rows.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_display_names_resolve_from_the_latest_named_row(pool: PgPool) {
    // Arrange
    let repo = PgPresenceRepository::new(pool);
    let earlier = Utc::now() - Duration::seconds(30);
    repo.upsert(Uuid::new_v4(), "alice", None, Some("Alice"), earlier)
        .await
        .unwrap();
    repo.upsert(Uuid::new_v4(), "alice", None, Some("Alice A."), Utc::now())
        .await
        .unwrap();
    repo.upsert(Uuid::new_v4(), "bob", None, None, Utc::now()).await.unwrap();
    let wanted: BTreeSet<String> = ["alice", "bob"].into_iter().map(String::from).collect();

    // Act
    let resolved = repo.resolve_display_names(&wanted).await.unwrap();

    // Assert
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved["alice"], "Alice A.");
}
