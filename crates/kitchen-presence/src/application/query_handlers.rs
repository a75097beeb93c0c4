//! Query handlers for the Presence context.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use kitchen_core::clock::Clock;
use kitchen_core::error::DomainError;
use kitchen_core::identity::DisplayNameResolver;
use kitchen_core::repository::EventRepository;
use kitchen_project::application::query_handlers::get_project_by_id;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::presence::PresenceStatus;
use crate::domain::repository::PresenceRepository;

/// A participant currently active in a project.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    /// The participant.
    pub user_id: String,
    /// Name from the participant's heartbeats, else the resolved display
    /// name, else the user id.
    pub display_name: String,
    /// Last reported status.
    pub status: PresenceStatus,
    /// Time of the last heartbeat.
    pub last_seen_at: DateTime<Utc>,
}

/// Participants whose last heartbeat is within the activity window at the
/// clock's current time, most recently seen first.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project and
/// propagates storage and display-name lookup failures.
pub async fn active_participants(
    project_id: Uuid,
    clock: &dyn Clock,
    presence: &dyn PresenceRepository,
    repo: &dyn EventRepository,
    names: &dyn DisplayNameResolver,
) -> Result<Vec<ParticipantView>, DomainError> {
    get_project_by_id(project_id, repo).await?;
    let now = clock.now();
    let mut active: Vec<_> = presence
        .list_for_project(project_id)
        .await?
        .into_iter()
        .filter(|row| row.is_active_at(now))
        .collect();
    active.sort_by(|a, b| {
        b.last_seen_at
            .cmp(&a.last_seen_at)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    let unnamed: BTreeSet<String> = active
        .iter()
        .filter(|row| row.display_name.is_none())
        .map(|row| row.user_id.clone())
        .collect();
    let resolved = if unnamed.is_empty() {
        HashMap::new()
    } else {
        names.resolve_display_names(&unnamed).await?
    };

    Ok(active
        .into_iter()
        .map(|row| ParticipantView {
            display_name: row
                .display_name
                .or_else(|| resolved.get(&row.user_id).cloned())
                .unwrap_or_else(|| row.user_id.clone()),
            user_id: row.user_id,
            status: row.status,
            last_seen_at: row.last_seen_at,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use kitchen_core::access::{Actor, Role};
    use kitchen_project::application::command_handlers::handle_create_project;
    use kitchen_project::domain::commands::CreateProject;
    use kitchen_test_support::{FixedClock, InMemoryEventRepository, StaticDisplayNames};

    use super::*;
    use crate::memory::InMemoryPresenceRepository;

    async fn project(repo: &InMemoryEventRepository) -> Uuid {
        let project_id = Uuid::new_v4();
        handle_create_project(
            &CreateProject {
                correlation_id: Uuid::new_v4(),
                project_id,
                title: "Curry night".to_owned(),
                description: None,
                actor: Actor::new("carol", Role::Owner),
            },
            &FixedClock::at_fixed_now(),
            repo,
        )
        .await
        .unwrap();
        project_id
    }

    #[tokio::test]
    async fn test_active_window_includes_59s_and_excludes_61s() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let presence = InMemoryPresenceRepository::new();
        let project_id = project(&repo).await;
        let now = FixedClock::at_fixed_now();
        let start = now.advanced_by(-61);
        presence.upsert(project_id, "stale", None, None, start.0).await.unwrap();
        presence
            .upsert(project_id, "fresh", None, None, now.advanced_by(-59).0)
            .await
            .unwrap();
        let names = StaticDisplayNames::new([("fresh", "Fresh Face")]);

        // Act
        let active = active_participants(project_id, &now, &presence, &repo, &names)
            .await
            .unwrap();

        // Assert
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].user_id, "fresh");
        assert_eq!(active[0].display_name, "Fresh Face");
    }

    #[tokio::test]
    async fn test_staleness_is_relative_to_read_time() {
        let repo = InMemoryEventRepository::new();
        let presence = InMemoryPresenceRepository::new();
        let project_id = project(&repo).await;
        let seen = FixedClock::at_fixed_now();
        presence.upsert(project_id, "alice", None, None, seen.0).await.unwrap();
        let names = StaticDisplayNames::new([("bob", "Bob")]);

        let soon = active_participants(project_id, &seen.advanced_by(30), &presence, &repo, &names)
            .await
            .unwrap();
        let later = active_participants(project_id, &seen.advanced_by(90), &presence, &repo, &names)
            .await
            .unwrap();

        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].display_name, "alice");
        assert!(later.is_empty());
    }

    #[tokio::test]
    async fn test_most_recent_first() {
        let repo = InMemoryEventRepository::new();
        let presence = InMemoryPresenceRepository::new();
        let project_id = project(&repo).await;
        let now = FixedClock::at_fixed_now();
        presence
            .upsert(project_id, "earlier", None, None, now.advanced_by(-20).0)
            .await
            .unwrap();
        presence.upsert(project_id, "latest", None, None, now.0).await.unwrap();
        let names = StaticDisplayNames::new([("x", "X")]);

        let active = active_participants(project_id, &now, &presence, &repo, &names)
            .await
            .unwrap();

        let order: Vec<&str> = active.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(order, vec!["latest", "earlier"]);
    }

    #[tokio::test]
    async fn test_heartbeat_name_wins_over_the_resolver() {
        let repo = InMemoryEventRepository::new();
        let presence = InMemoryPresenceRepository::new();
        let project_id = project(&repo).await;
        let now = FixedClock::at_fixed_now();
        presence
            .upsert(project_id, "alice", None, Some("Alice"), now.0)
            .await
            .unwrap();
        let names = StaticDisplayNames::new([("alice", "Someone Else")]);

        let active = active_participants(project_id, &now, &presence, &repo, &names)
            .await
            .unwrap();

        assert_eq!(active[0].display_name, "Alice");
    }
}
