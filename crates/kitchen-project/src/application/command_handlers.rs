//! Command handlers for the Project context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use kitchen_core::aggregate::AggregateRoot;
use kitchen_core::clock::Clock;
use kitchen_core::command::Command;
use kitchen_core::error::DomainError;
use kitchen_core::event::EventMetadata;
use kitchen_core::repository::{EventRepository, StoredEvent, retry_on_conflict};
use kitchen_core::stream::project_directory_id;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::aggregates::{Project, ProjectDirectory};
use crate::domain::commands::{CreateProject, DeleteProject, TransitionPhase};
use crate::domain::events::{DirectoryEvent, DirectoryEventKind, ProjectEvent, ProjectEventKind};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct ProjectCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes a `Project` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    project_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Project, DomainError> {
    let mut project = Project::new(project_id);
    for stored in existing_events {
        let kind: ProjectEventKind =
            serde_json::from_value(stored.payload.clone()).map_err(|e| {
                DomainError::Infrastructure(format!("event deserialization failed: {e}"))
            })?;
        let event = ProjectEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        project.apply(&event);
    }
    Ok(project)
}

/// Loads a live (existing, not deleted) project.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the project has no events or
/// has been deleted.
pub(crate) async fn load_live_project(
    project_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Project, DomainError> {
    let existing_events = repo.load_events(project_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(project_id));
    }
    let project = reconstitute(project_id, &existing_events)?;
    if project.deleted {
        return Err(DomainError::AggregateNotFound(project_id));
    }
    Ok(project)
}

/// Loads the project directory. An empty stream is an empty directory.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage or decoding failures.
pub(crate) async fn load_directory(
    repo: &dyn EventRepository,
) -> Result<ProjectDirectory, DomainError> {
    let id = project_directory_id();
    let mut directory = ProjectDirectory::new(id);
    for stored in repo.load_events(id).await? {
        let kind: DirectoryEventKind = serde_json::from_value(stored.payload.clone())
            .map_err(|e| {
                DomainError::Infrastructure(format!("event deserialization failed: {e}"))
            })?;
        directory.apply(&DirectoryEvent {
            metadata: EventMetadata::from_stored(&stored),
            kind,
        });
    }
    Ok(directory)
}

/// Lists or unlists `project_id`, re-reading the directory when another
/// write lands first.
async fn update_directory(
    project_id: Uuid,
    listed: bool,
    correlation_id: Uuid,
    recorded_by: &str,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<(), DomainError> {
    retry_on_conflict(|| async move {
        let mut directory = load_directory(repo).await?;
        let changed = if listed {
            directory.list(project_id, correlation_id, recorded_by, clock)
        } else {
            directory.unlist(project_id, correlation_id, recorded_by, clock)
        };
        if changed {
            repo.append_events(
                directory.id,
                directory.version(),
                &directory.pending_stored_events(),
            )
            .await?;
        }
        debug!(%project_id, listed, changed, "project directory updated");
        Ok::<(), DomainError>(())
    })
    .await
}

async fn persist(
    project: &Project,
    repo: &dyn EventRepository,
) -> Result<ProjectCommandResult, DomainError> {
    let stored_events = project.pending_stored_events();
    if !stored_events.is_empty() {
        repo.append_events(project.id, project.version(), &stored_events)
            .await?;
    }
    Ok(ProjectCommandResult {
        aggregate_id: project.id,
        stored_events,
    })
}

/// Handles the `CreateProject` command.
///
/// This is a CREATION command; the caller chooses the `project_id`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank title, or `DomainError` if
/// event appending fails.
pub async fn handle_create_project(
    command: &CreateProject,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ProjectCommandResult, DomainError> {
    let mut project = Project::new(command.project_id);

    project.create(
        &command.title,
        command.description.as_deref(),
        &command.actor,
        command.correlation_id,
        clock,
    )?;

    info!(
        project_id = %command.project_id(),
        command_type = command.command_type(),
        owner_id = %command.actor.user_id,
        "project created"
    );

    let result = persist(&project, repo).await?;
    update_directory(
        command.project_id,
        true,
        command.correlation_id,
        &command.actor.user_id,
        clock,
        repo,
    )
    .await?;
    Ok(result)
}

/// Handles the `TransitionPhase` command. Re-requesting the current phase
/// succeeds without appending anything.
///
/// # Errors
///
/// Returns `DomainError` if the project is missing, the actor is not
/// privileged, the transition is invalid, or persistence fails.
pub async fn handle_transition_phase(
    command: &TransitionPhase,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ProjectCommandResult, DomainError> {
    let mut project = load_live_project(command.project_id, repo).await?;
    let from = project.phase;

    let changed = project.transition_phase(
        command.target,
        &command.actor,
        command.correlation_id,
        clock,
    )?;

    info!(
        project_id = %command.project_id,
        %from,
        to = %command.target,
        changed,
        "phase transition handled"
    );

    persist(&project, repo).await
}

/// Handles the `DeleteProject` command.
///
/// # Errors
///
/// Returns `DomainError` if the project is missing, the actor is not
/// privileged, or persistence fails.
pub async fn handle_delete_project(
    command: &DeleteProject,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ProjectCommandResult, DomainError> {
    let mut project = load_live_project(command.project_id, repo).await?;

    project.delete(&command.actor, command.correlation_id, clock)?;

    info!(project_id = %command.project_id, "project deleted");

    let result = persist(&project, repo).await?;
    update_directory(
        command.project_id,
        false,
        command.correlation_id,
        &command.actor.user_id,
        clock,
        repo,
    )
    .await?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use kitchen_core::access::{Actor, Role};
    use kitchen_core::error::DomainError;
    use kitchen_core::repository::EventRepository;
    use kitchen_test_support::{
        EmptyEventRepository, FailingEventRepository, FixedClock, InMemoryEventRepository,
        RecordingEventRepository,
    };
    use uuid::Uuid;

    use super::*;
    use crate::domain::phase::Phase;

    fn chair() -> Actor {
        Actor::new("carol", Role::Owner)
    }

    async fn create(repo: &dyn EventRepository, clock: &FixedClock) -> Uuid {
        let project_id = Uuid::new_v4();
        handle_create_project(
            &CreateProject {
                correlation_id: Uuid::new_v4(),
                project_id,
                title: "Curry night".to_owned(),
                description: None,
                actor: chair(),
            },
            clock,
            repo,
        )
        .await
        .unwrap();
        project_id
    }

    fn transition(project_id: Uuid, target: Phase) -> TransitionPhase {
        TransitionPhase {
            correlation_id: Uuid::new_v4(),
            project_id,
            target,
            actor: chair(),
        }
    }

    #[tokio::test]
    async fn test_handle_create_project_appends_created_event() {
        // Arrange
        let clock = FixedClock::at_fixed_now();
        let repo = RecordingEventRepository::new(Vec::new());
        let project_id = Uuid::new_v4();
        let command = CreateProject {
            correlation_id: Uuid::new_v4(),
            project_id,
            title: "Curry night".to_owned(),
            description: Some("weekly".to_owned()),
            actor: Actor::anonymous(),
        };

        // Act
        let result = handle_create_project(&command, &clock, &repo).await.unwrap();

        // Assert
        assert_eq!(result.aggregate_id, project_id);
        let appended = repo.appended_events();
        assert_eq!(appended.len(), 2);
        let (aggregate_id, expected_version, events) = &appended[0];
        assert_eq!(*aggregate_id, project_id);
        assert_eq!(*expected_version, 0);
        assert_eq!(events[0].recorded_by, "anonymous");
        let (directory_id, _, listed) = &appended[1];
        assert_eq!(*directory_id, project_directory_id());
        assert_eq!(listed[0].event_type, "directory.project_listed");
    }

    #[tokio::test]
    async fn test_handle_transition_phase_returns_not_found_for_missing_project() {
        let clock = FixedClock::at_fixed_now();
        let project_id = Uuid::new_v4();

        let result =
            handle_transition_phase(&transition(project_id, Phase::ImageUpload), &clock, &EmptyEventRepository)
                .await;

        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, project_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_transition_phase_archive_twice_is_idempotent() {
        // Arrange
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let project_id = create(&repo, &clock).await;

        // Act
        let first = handle_transition_phase(&transition(project_id, Phase::Archived), &clock, &repo)
            .await
            .unwrap();
        let second =
            handle_transition_phase(&transition(project_id, Phase::Archived), &clock, &repo)
                .await
                .unwrap();

        // Assert
        assert_eq!(first.stored_events.len(), 1);
        assert!(second.stored_events.is_empty());
        let project = load_live_project(project_id, &repo).await.unwrap();
        assert_eq!(project.phase, Phase::Archived);
    }

    #[tokio::test]
    async fn test_handle_transition_phase_restores_archived_to_cooking() {
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let project_id = create(&repo, &clock).await;

        handle_transition_phase(&transition(project_id, Phase::Archived), &clock, &repo)
            .await
            .unwrap();
        handle_transition_phase(&transition(project_id, Phase::Cooking), &clock, &repo)
            .await
            .unwrap();

        let project = load_live_project(project_id, &repo).await.unwrap();
        assert_eq!(project.phase, Phase::Cooking);
    }

    #[tokio::test]
    async fn test_handle_transition_phase_rejects_skipping_phases() {
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let project_id = create(&repo, &clock).await;

        let result =
            handle_transition_phase(&transition(project_id, Phase::Download), &clock, &repo).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(repo.stream_len(project_id), 1);
    }

    #[tokio::test]
    async fn test_handle_delete_project_hides_project() {
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let project_id = create(&repo, &clock).await;

        handle_delete_project(
            &DeleteProject {
                correlation_id: Uuid::new_v4(),
                project_id,
                actor: chair(),
            },
            &clock,
            &repo,
        )
        .await
        .unwrap();

        let result = load_live_project(project_id, &repo).await;
        assert!(matches!(result, Err(DomainError::AggregateNotFound(_))));
    }

    #[tokio::test]
    async fn test_handle_create_project_propagates_repository_failure() {
        let clock = FixedClock::at_fixed_now();
        let command = CreateProject {
            correlation_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Curry night".to_owned(),
            description: None,
            actor: chair(),
        };

        let result = handle_create_project(&command, &clock, &FailingEventRepository).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
