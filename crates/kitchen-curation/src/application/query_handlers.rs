//! Query handlers for the Curation context.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use kitchen_core::error::DomainError;
use kitchen_core::identity::DisplayNameResolver;
use kitchen_core::repository::EventRepository;
use kitchen_script::application::query_handlers::list_ordered;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::load_pool;
use crate::domain::aggregates::Image;

/// Read-only view of an image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    /// The image identifier.
    pub image_id: Uuid,
    /// Assigned section; `None` if unassigned or the section was deleted.
    pub section_id: Option<Uuid>,
    /// Uploader, or `anonymous`.
    pub uploaded_by: String,
    /// Public URL of the object.
    pub image_url: String,
    /// Object storage key.
    pub storage_key: String,
    /// Adoption flag.
    pub is_selected: bool,
    /// Free-form comment.
    pub comment: String,
    /// When the image was registered.
    pub created_at: DateTime<Utc>,
    /// When the image last changed.
    pub updated_at: DateTime<Utc>,
}

impl ImageView {
    fn from_image(image: &Image, positions: &HashMap<Uuid, usize>) -> Self {
        Self {
            image_id: image.id,
            section_id: image.section_id.filter(|id| positions.contains_key(id)),
            uploaded_by: image.uploaded_by.clone(),
            image_url: image.image_url.clone(),
            storage_key: image.storage_key.clone(),
            is_selected: image.is_selected,
            comment: image.comment.clone(),
            created_at: image.created_at,
            updated_at: image.updated_at,
        }
    }
}

/// A selected image labelled for export.
#[derive(Debug, Clone, Serialize)]
pub struct SelectedImageView {
    /// The image identifier.
    pub image_id: Uuid,
    /// Public URL of the object.
    pub image_url: String,
    /// Assigned section, if it still exists.
    pub section_id: Option<Uuid>,
    /// Position of that section, `0..N`.
    pub section_index: Option<usize>,
    /// Uploader, or `anonymous`.
    pub uploaded_by: String,
    /// Name recorded at submission, else the resolved display name, else
    /// the user id.
    pub uploader_name: String,
}

async fn section_positions(
    project_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<HashMap<Uuid, usize>, DomainError> {
    Ok(list_ordered(project_id, repo)
        .await?
        .into_iter()
        .map(|s| (s.section_id, s.order_index))
        .collect())
}

/// Lists every image of a project, newest first.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project.
pub async fn list_images(
    project_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Vec<ImageView>, DomainError> {
    let positions = section_positions(project_id, repo).await?;
    let pool = load_pool(project_id, repo).await?;
    let mut views: Vec<ImageView> = pool
        .images
        .iter()
        .rev()
        .map(|image| ImageView::from_image(image, &positions))
        .collect();
    views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(views)
}

/// Retrieves one image.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project and
/// `DomainError::NotFound` for an unknown image.
pub async fn get_image(
    project_id: Uuid,
    image_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<ImageView, DomainError> {
    let positions = section_positions(project_id, repo).await?;
    let pool = load_pool(project_id, repo).await?;
    pool.existing(image_id)
        .map(|image| ImageView::from_image(image, &positions))
}

/// Lists the selected images ordered by their section's position. Images
/// whose section no longer exists come last, in submission order. Only
/// uploads submitted without a display name go through `names`.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project and
/// propagates display-name lookup failures.
pub async fn list_selected(
    project_id: Uuid,
    repo: &dyn EventRepository,
    names: &dyn DisplayNameResolver,
) -> Result<Vec<SelectedImageView>, DomainError> {
    let positions = section_positions(project_id, repo).await?;
    let pool = load_pool(project_id, repo).await?;
    let selected: Vec<&Image> = pool.images.iter().filter(|i| i.is_selected).collect();

    let unnamed: BTreeSet<String> = selected
        .iter()
        .filter(|i| i.uploader_name.is_none())
        .map(|i| i.uploaded_by.clone())
        .collect();
    let resolved = if unnamed.is_empty() {
        HashMap::new()
    } else {
        names.resolve_display_names(&unnamed).await?
    };

    let mut views: Vec<SelectedImageView> = selected
        .into_iter()
        .map(|image| {
            let section_index = image.section_id.and_then(|id| positions.get(&id).copied());
            SelectedImageView {
                image_id: image.id,
                image_url: image.image_url.clone(),
                section_id: section_index.and(image.section_id),
                section_index,
                uploaded_by: image.uploaded_by.clone(),
                uploader_name: image
                    .uploader_name
                    .clone()
                    .or_else(|| resolved.get(&image.uploaded_by).cloned())
                    .unwrap_or_else(|| image.uploaded_by.clone()),
            }
        })
        .collect();
    views.sort_by_key(|view| view.section_index.unwrap_or(usize::MAX));
    Ok(views)
}
