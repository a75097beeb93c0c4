//! Command handlers for the Curation context.

use kitchen_core::access::{Actor, Operation};
use kitchen_core::aggregate::AggregateRoot;
use kitchen_core::clock::Clock;
use kitchen_core::error::DomainError;
use kitchen_core::event::EventMetadata;
use kitchen_core::repository::{EventRepository, StoredEvent, retry_on_conflict};
use kitchen_core::storage::{ObjectStorage, UploadTarget};
use kitchen_core::stream::ProjectStream;
use kitchen_project::application::query_handlers::authorize_operation;
use kitchen_script::application::query_handlers::get_section;
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::ImagePool;
use crate::domain::commands::{
    ConfirmUpload, DeleteImage, RequestUploadSlot, SetImageComment, SetImageSelection,
};
use crate::domain::events::{CurationEvent, CurationEventKind};
use crate::storage::{project_key_prefix, upload_key};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct CurationCommandResult {
    /// The image pool stream affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes a project's `ImagePool` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    project_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<ImagePool, DomainError> {
    let mut pool = ImagePool::new(project_id);
    for stored in existing_events {
        let kind: CurationEventKind =
            serde_json::from_value(stored.payload.clone()).map_err(|e| {
                DomainError::Infrastructure(format!("event deserialization failed: {e}"))
            })?;
        let event = CurationEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        pool.apply(&event);
    }
    Ok(pool)
}

/// Loads the image pool of `project_id`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage or decoding failures.
pub(crate) async fn load_pool(
    project_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<ImagePool, DomainError> {
    let stream_id = ProjectStream::ImagePool.id_for(project_id);
    let existing_events = repo.load_events(stream_id).await?;
    reconstitute(project_id, &existing_events)
}

async fn persist(
    pool: &ImagePool,
    repo: &dyn EventRepository,
) -> Result<CurationCommandResult, DomainError> {
    let stored_events = pool.pending_stored_events();
    if !stored_events.is_empty() {
        repo.append_events(pool.id, pool.version(), &stored_events)
            .await?;
    }
    Ok(CurationCommandResult {
        aggregate_id: pool.id,
        stored_events,
    })
}

/// Sections must exist and accept submissions to receive an image.
async fn require_open_section(
    project_id: Uuid,
    section_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<(), DomainError> {
    let section = get_section(project_id, section_id, repo).await?;
    if section.allow_image_submission {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "section {section_id} does not accept images"
        )))
    }
}

/// Uploader-or-privileged gate shared by comment and delete. Loads the pool
/// the caller goes on to mutate.
async fn authorize_image_management(
    project_id: Uuid,
    image_id: Uuid,
    actor: &Actor,
    repo: &dyn EventRepository,
) -> Result<ImagePool, DomainError> {
    let operation = if actor.role.is_privileged() {
        Operation::ManageAnyImage
    } else {
        actor.require_session()?;
        Operation::ManageOwnImage
    };
    authorize_operation(project_id, actor, operation, repo).await?;

    let pool = load_pool(project_id, repo).await?;
    let image = pool.existing(image_id)?;
    if !actor.may_manage_image(&image.uploaded_by) {
        return Err(DomainError::Unauthorized(format!(
            "only the uploader or a privileged role may change image {image_id}"
        )));
    }
    Ok(pool)
}

/// Handles the `RequestUploadSlot` command: mints a signed upload target
/// under the project's key prefix. Nothing is recorded until the upload is
/// confirmed.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` without a session or outside the
/// upload phases, `DomainError::Upload` when the storage provider refuses,
/// and `DomainError::AggregateNotFound` for a missing project.
pub async fn handle_request_upload_slot(
    command: &RequestUploadSlot,
    storage: &dyn ObjectStorage,
    repo: &dyn EventRepository,
) -> Result<UploadTarget, DomainError> {
    command.actor.require_session()?;
    authorize_operation(command.project_id, &command.actor, Operation::SubmitImage, repo).await?;

    let key = upload_key(command.project_id, &command.filename);
    let upload_url = storage
        .issue_upload_target(&key, &command.content_type)
        .await?;

    info!(
        project_id = %command.project_id,
        correlation_id = %command.correlation_id,
        %key,
        "upload slot issued"
    );

    Ok(UploadTarget {
        upload_url,
        public_url: storage.public_url_for(&key),
        key,
    })
}

/// Handles the `ConfirmUpload` command: registers the uploaded object as an
/// unselected image.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a key outside the project's prefix
/// or a section closed to submissions, `DomainError::NotFound` for an
/// unknown section, and the usual gate and persistence errors.
pub async fn handle_confirm_upload(
    command: &ConfirmUpload,
    storage: &dyn ObjectStorage,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<CurationCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::SubmitImage, repo).await?;
    if !command
        .storage_key
        .starts_with(&project_key_prefix(command.project_id))
    {
        return Err(DomainError::Validation(format!(
            "storage key {} does not belong to project {}",
            command.storage_key, command.project_id
        )));
    }
    if let Some(section_id) = command.section_id {
        require_open_section(command.project_id, section_id, repo).await?;
    }

    let image_url = &storage.public_url_for(&command.storage_key);
    let result = retry_on_conflict(|| async move {
        let mut pool = load_pool(command.project_id, repo).await?;
        pool.submit(
            command.image_id,
            command.section_id,
            &command.storage_key,
            image_url,
            command.correlation_id,
            &command.actor.user_id,
            command.uploader_name.as_deref(),
            clock,
        )?;
        persist(&pool, repo).await
    })
    .await?;

    info!(
        project_id = %command.project_id,
        image_id = %command.image_id,
        uploaded_by = %command.actor.user_id,
        "image submitted"
    );

    Ok(result)
}

/// Handles the `SetImageSelection` command. Repeating the current state
/// records nothing.
///
/// # Errors
///
/// Returns `DomainError::Validation` when selecting into no section or a
/// section closed to submissions, `DomainError::NotFound` for an unknown
/// image or section, and the usual gate and persistence errors.
pub async fn handle_set_image_selection(
    command: &SetImageSelection,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<CurationCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::SelectImage, repo).await?;
    if let Some(section_id) = command.section_id {
        if command.is_selected {
            require_open_section(command.project_id, section_id, repo).await?;
        } else {
            get_section(command.project_id, section_id, repo).await?;
        }
    }

    let (result, changed) = retry_on_conflict(|| async move {
        let mut pool = load_pool(command.project_id, repo).await?;
        let changed = pool.set_selection(
            command.image_id,
            command.section_id,
            command.is_selected,
            command.correlation_id,
            &command.actor.user_id,
            clock,
        )?;
        Ok::<_, DomainError>((persist(&pool, repo).await?, changed))
    })
    .await?;

    info!(
        project_id = %command.project_id,
        image_id = %command.image_id,
        is_selected = command.is_selected,
        changed,
        "image selection set"
    );

    Ok(result)
}

/// Handles the `SetImageComment` command.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` unless the actor uploaded the image
/// or holds a privileged role, `DomainError::NotFound` for an unknown
/// image, and persistence errors.
pub async fn handle_set_image_comment(
    command: &SetImageComment,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<CurationCommandResult, DomainError> {
    let (result, changed) = retry_on_conflict(|| async move {
        let mut pool =
            authorize_image_management(command.project_id, command.image_id, &command.actor, repo)
                .await?;
        let changed = pool.set_comment(
            command.image_id,
            &command.comment,
            command.correlation_id,
            &command.actor.user_id,
            clock,
        )?;
        Ok::<_, DomainError>((persist(&pool, repo).await?, changed))
    })
    .await?;

    info!(
        project_id = %command.project_id,
        image_id = %command.image_id,
        changed,
        "image comment set"
    );

    Ok(result)
}

/// Handles the `DeleteImage` command. The stored object stays in the
/// bucket.
///
/// # Errors
///
/// Same as [`handle_set_image_comment`].
pub async fn handle_delete_image(
    command: &DeleteImage,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<CurationCommandResult, DomainError> {
    let result = retry_on_conflict(|| async move {
        let mut pool =
            authorize_image_management(command.project_id, command.image_id, &command.actor, repo)
                .await?;
        pool.delete(
            command.image_id,
            command.correlation_id,
            &command.actor.user_id,
            clock,
        )?;
        persist(&pool, repo).await
    })
    .await?;

    info!(
        project_id = %command.project_id,
        image_id = %command.image_id,
        deleted_by = %command.actor.user_id,
        "image deleted"
    );

    Ok(result)
}
