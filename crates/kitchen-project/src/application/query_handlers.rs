//! Query handlers for the Project context.
//!
//! Besides the read model, this is where other contexts go to ask whether an
//! actor may perform an operation in the project's current phase.

use chrono::{DateTime, Utc};
use kitchen_core::access::{Actor, Operation};
use kitchen_core::error::DomainError;
use kitchen_core::repository::EventRepository;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::application::command_handlers;
use crate::domain::phase::{self, Navigation, Phase};

/// Read-only view of a project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    /// The project identifier.
    pub project_id: Uuid,
    /// Project title.
    pub title: String,
    /// Project description.
    pub description: String,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Creator of the project.
    pub owner_id: String,
    /// When the project was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the project last changed.
    pub updated_at: Option<DateTime<Utc>>,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves a live project by its id.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the project does not exist or
/// has been deleted, `DomainError::Infrastructure` on storage failures.
pub async fn get_project_by_id(
    project_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<ProjectView, DomainError> {
    let project = command_handlers::load_live_project(project_id, repo).await?;
    Ok(ProjectView {
        project_id,
        title: project.title,
        description: project.description,
        phase: project.phase,
        owner_id: project.owner_id,
        created_at: project.created_at,
        updated_at: project.updated_at,
        version: project.version,
    })
}

/// Lists every live project, newest first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage failures.
pub async fn list_projects(repo: &dyn EventRepository) -> Result<Vec<ProjectView>, DomainError> {
    let directory = command_handlers::load_directory(repo).await?;
    let mut views = Vec::with_capacity(directory.project_ids.len());
    for project_id in directory.project_ids.iter().rev() {
        match get_project_by_id(*project_id, repo).await {
            Ok(view) => views.push(view),
            Err(DomainError::AggregateNotFound(_)) => {
                debug!(%project_id, "listed project is gone, skipping");
            }
            Err(e) => return Err(e),
        }
    }
    // Stable: equal timestamps keep the later listing first.
    views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(views)
}

/// Loads the project and applies the role and phase gate for `operation`.
///
/// Returns the project view so callers can reuse it.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project and
/// `DomainError::Unauthorized` when the gate is closed.
pub async fn authorize_operation(
    project_id: Uuid,
    actor: &Actor,
    operation: Operation,
    repo: &dyn EventRepository,
) -> Result<ProjectView, DomainError> {
    let view = get_project_by_id(project_id, repo).await?;
    phase::authorize(actor, view.phase, operation)?;
    debug!(
        %project_id,
        user_id = %actor.user_id,
        role = %actor.role,
        ?operation,
        phase = %view.phase,
        "operation authorized"
    );
    Ok(view)
}

/// Which tabs `actor` may open in the project right now.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project.
pub async fn get_navigation(
    project_id: Uuid,
    actor: &Actor,
    repo: &dyn EventRepository,
) -> Result<Navigation, DomainError> {
    let view = get_project_by_id(project_id, repo).await?;
    Ok(phase::navigation(actor, view.phase))
}

#[cfg(test)]
mod tests {
    use kitchen_core::access::{Actor, Operation, Role};
    use kitchen_core::error::DomainError;
    use kitchen_test_support::{EmptyEventRepository, FixedClock, InMemoryEventRepository};
    use uuid::Uuid;

    use super::*;
    use crate::application::command_handlers::{
        handle_create_project, handle_delete_project, handle_transition_phase,
    };
    use crate::domain::commands::{CreateProject, DeleteProject, TransitionPhase};
    use crate::domain::phase::Tab;

    async fn project_in(repo: &InMemoryEventRepository, phases: &[Phase]) -> Uuid {
        let clock = FixedClock::at_fixed_now();
        let chair = Actor::new("carol", Role::Owner);
        let project_id = Uuid::new_v4();
        handle_create_project(
            &CreateProject {
                correlation_id: Uuid::new_v4(),
                project_id,
                title: "Curry night".to_owned(),
                description: Some("weekly".to_owned()),
                actor: chair.clone(),
            },
            &clock,
            repo,
        )
        .await
        .unwrap();
        for target in phases {
            handle_transition_phase(
                &TransitionPhase {
                    correlation_id: Uuid::new_v4(),
                    project_id,
                    target: *target,
                    actor: chair.clone(),
                },
                &clock,
                repo,
            )
            .await
            .unwrap();
        }
        project_id
    }

    #[tokio::test]
    async fn test_get_project_by_id_returns_view() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let project_id = project_in(&repo, &[Phase::ImageUpload]).await;

        // Act
        let view = get_project_by_id(project_id, &repo).await.unwrap();

        // Assert
        assert_eq!(view.project_id, project_id);
        assert_eq!(view.title, "Curry night");
        assert_eq!(view.description, "weekly");
        assert_eq!(view.phase, Phase::ImageUpload);
        assert_eq!(view.owner_id, "carol");
        assert_eq!(view.version, 2);
    }

    #[tokio::test]
    async fn test_get_project_by_id_returns_not_found_when_no_events() {
        let project_id = Uuid::new_v4();

        let result = get_project_by_id(project_id, &EmptyEventRepository).await;

        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, project_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authorize_operation_closes_proposals_after_cooking() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let project_id = project_in(&repo, &[Phase::ImageUpload]).await;
        let member = Actor::new("alice", Role::Member);

        // Act
        let proposal = authorize_operation(project_id, &member, Operation::SubmitProposal, &repo).await;
        let image = authorize_operation(project_id, &member, Operation::SubmitImage, &repo).await;

        // Assert
        assert!(matches!(proposal, Err(DomainError::Unauthorized(_))));
        assert!(image.is_ok());
    }

    #[tokio::test]
    async fn test_authorize_operation_lets_privileged_edit_in_any_phase() {
        let repo = InMemoryEventRepository::new();
        let project_id = project_in(&repo, &[Phase::Archived]).await;
        let honorary = Actor::new("erin", Role::Honorary);

        let result =
            authorize_operation(project_id, &honorary, Operation::EditSection, &repo).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_get_navigation_pins_member_to_phase_tab() {
        let repo = InMemoryEventRepository::new();
        let project_id = project_in(&repo, &[Phase::ImageUpload, Phase::ImageSelection]).await;

        let nav = get_navigation(project_id, &Actor::new("alice", Role::Member), &repo)
            .await
            .unwrap();

        assert!(nav.forced);
        assert_eq!(nav.current_tab, Tab::ImageSelection);
        assert_eq!(nav.open_tabs, vec![Tab::ImageSelection]);
    }

    #[tokio::test]
    async fn test_list_projects_is_newest_first_and_skips_deleted() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let chair = Actor::new("carol", Role::Owner);
        let mut ids = Vec::new();
        for (title, offset) in [("Soup", 60), ("Stew", 120), ("Curry", 0)] {
            let project_id = Uuid::new_v4();
            handle_create_project(
                &CreateProject {
                    correlation_id: Uuid::new_v4(),
                    project_id,
                    title: title.to_owned(),
                    description: None,
                    actor: chair.clone(),
                },
                &FixedClock::at_fixed_now().advanced_by(offset),
                &repo,
            )
            .await
            .unwrap();
            ids.push(project_id);
        }
        handle_delete_project(
            &DeleteProject {
                correlation_id: Uuid::new_v4(),
                project_id: ids[1],
                actor: chair,
            },
            &FixedClock::at_fixed_now(),
            &repo,
        )
        .await
        .unwrap();

        // Act
        let projects = list_projects(&repo).await.unwrap();

        // Assert
        let titles: Vec<&str> = projects.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Soup", "Curry"]);
    }

    #[tokio::test]
    async fn test_list_projects_is_empty_without_projects() {
        let projects = list_projects(&EmptyEventRepository).await.unwrap();

        assert!(projects.is_empty());
    }
}
