//! Query handlers for the Script context.

use chrono::{DateTime, Utc};
use kitchen_core::error::DomainError;
use kitchen_core::repository::EventRepository;
use kitchen_project::application::query_handlers::get_project_by_id;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::load_script;
use crate::domain::aggregates::Section;
use crate::domain::draft::SectionFields;

/// Read-only view of a section.
#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    /// The section identifier.
    pub section_id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Position in the script, `0..N`.
    pub order_index: usize,
    /// Body text.
    pub content: String,
    /// Guidance for image contributors.
    pub image_instruction: String,
    /// Reference image URLs; `None` if never set, empty if unreadable.
    pub reference_image_urls: Option<Vec<String>>,
    /// Whether images may be submitted for this section.
    pub allow_image_submission: bool,
    /// When the section was created.
    pub created_at: DateTime<Utc>,
    /// When the section last changed.
    pub updated_at: DateTime<Utc>,
}

impl SectionView {
    fn from_section(project_id: Uuid, order_index: usize, section: &Section) -> Self {
        Self {
            section_id: section.id,
            project_id,
            order_index,
            content: section.content.clone(),
            image_instruction: section.image_instruction.clone(),
            reference_image_urls: section.parsed_reference_image_urls(),
            allow_image_submission: section.allow_image_submission,
            created_at: section.created_at,
            updated_at: section.updated_at,
        }
    }

    /// The editable fields, for opening a `SectionDraft`.
    #[must_use]
    pub fn fields(&self) -> SectionFields {
        SectionFields {
            content: self.content.clone(),
            image_instruction: self.image_instruction.clone(),
            allow_image_submission: self.allow_image_submission,
            reference_image_urls: self.reference_image_urls.clone().unwrap_or_default(),
        }
    }
}

/// Lists the sections of a project in order.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project.
pub async fn list_ordered(
    project_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Vec<SectionView>, DomainError> {
    get_project_by_id(project_id, repo).await?;
    let script = load_script(project_id, repo).await?;
    Ok(script
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| SectionView::from_section(project_id, index, section))
        .collect())
}

/// Retrieves one section.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project and
/// `DomainError::NotFound` for a missing section.
pub async fn get_section(
    project_id: Uuid,
    section_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<SectionView, DomainError> {
    list_ordered(project_id, repo)
        .await?
        .into_iter()
        .find(|s| s.section_id == section_id)
        .ok_or_else(|| DomainError::not_found("section", section_id))
}

#[cfg(test)]
mod tests {
    use kitchen_core::access::{Actor, Role};
    use kitchen_core::error::DomainError;
    use kitchen_project::domain::commands::CreateProject;
    use kitchen_test_support::{FixedClock, InMemoryEventRepository};
    use uuid::Uuid;

    use super::*;
    use crate::application::command_handlers::{
        handle_create_project_with_script, handle_update_section,
    };
    use crate::domain::commands::UpdateSection;

    async fn seeded(repo: &InMemoryEventRepository) -> Uuid {
        let project_id = Uuid::new_v4();
        handle_create_project_with_script(
            &CreateProject {
                correlation_id: Uuid::new_v4(),
                project_id,
                title: "Curry night".to_owned(),
                description: None,
                actor: Actor::new("carol", Role::Owner),
            },
            "Intro\n\nMain",
            &FixedClock::at_fixed_now(),
            repo,
        )
        .await
        .unwrap();
        project_id
    }

    #[tokio::test]
    async fn test_list_ordered_returns_positions_and_defaults() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let project_id = seeded(&repo).await;

        // Act
        let sections = list_ordered(project_id, &repo).await.unwrap();

        // Assert
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].order_index, 0);
        assert_eq!(sections[0].content, "Intro");
        assert_eq!(sections[1].order_index, 1);
        assert!(sections[1].allow_image_submission);
        assert!(sections[1].reference_image_urls.is_none());
    }

    #[tokio::test]
    async fn test_list_ordered_for_missing_project_is_not_found() {
        let repo = InMemoryEventRepository::new();

        let result = list_ordered(Uuid::new_v4(), &repo).await;

        assert!(matches!(result, Err(DomainError::AggregateNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_section_round_trips_reference_urls() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let project_id = seeded(&repo).await;
        let section_id = list_ordered(project_id, &repo).await.unwrap()[1].section_id;
        handle_update_section(
            &UpdateSection {
                correlation_id: Uuid::new_v4(),
                project_id,
                section_id,
                content: None,
                image_instruction: None,
                allow_image_submission: None,
                reference_image_urls: Some(vec!["https://ref.test/a.png".to_owned()]),
                actor: Actor::new("carol", Role::Owner),
            },
            &FixedClock::at_fixed_now(),
            &repo,
        )
        .await
        .unwrap();

        // Act
        let view = get_section(project_id, section_id, &repo).await.unwrap();

        // Assert
        assert_eq!(
            view.reference_image_urls,
            Some(vec!["https://ref.test/a.png".to_owned()])
        );
        assert_eq!(view.fields().reference_image_urls.len(), 1);
    }

    #[tokio::test]
    async fn test_get_section_for_unknown_id_is_not_found() {
        let repo = InMemoryEventRepository::new();
        let project_id = seeded(&repo).await;

        let result = get_section(project_id, Uuid::new_v4(), &repo).await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
