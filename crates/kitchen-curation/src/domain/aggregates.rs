//! Aggregate roots for the Curation context.

use chrono::{DateTime, Utc};
use kitchen_core::aggregate::AggregateRoot;
use kitchen_core::clock::Clock;
use kitchen_core::error::DomainError;
use kitchen_core::event::EventMetadata;
use kitchen_core::stream::ProjectStream;
use uuid::Uuid;

use super::events::{
    CurationEvent, CurationEventKind, ImageCommented, ImageDeleted, ImageSelectionChanged,
    ImageSubmitted,
};

/// A submitted image candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Image identifier.
    pub id: Uuid,
    /// Assigned section, if any.
    pub section_id: Option<Uuid>,
    /// Uploader, or `anonymous`.
    pub uploaded_by: String,
    /// Display name recorded with the submission.
    pub uploader_name: Option<String>,
    /// Object storage key.
    pub storage_key: String,
    /// Public URL of the object.
    pub image_url: String,
    /// Adoption flag.
    pub is_selected: bool,
    /// Free-form comment.
    pub comment: String,
    /// When the image was registered.
    pub created_at: DateTime<Utc>,
    /// When the image last changed.
    pub updated_at: DateTime<Utc>,
}

/// Every image of one project, in submission order.
#[derive(Debug)]
pub struct ImagePool {
    /// Stream identifier, derived from the project id.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Images in submission order.
    pub images: Vec<Image>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<CurationEvent>,
}

impl ImagePool {
    /// Creates an empty pool for `project_id`.
    #[must_use]
    pub fn new(project_id: Uuid) -> Self {
        Self {
            id: ProjectStream::ImagePool.id_for(project_id),
            project_id,
            version: 0,
            images: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Looks an image up by id.
    #[must_use]
    pub fn image(&self, image_id: Uuid) -> Option<&Image> {
        self.images.iter().find(|i| i.id == image_id)
    }

    /// Looks an image up by id, failing when it is absent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown image.
    pub fn existing(&self, image_id: Uuid) -> Result<&Image, DomainError> {
        self.image(image_id)
            .ok_or_else(|| DomainError::not_found("image", image_id))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(
        &mut self,
        kind: CurationEventKind,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) {
        let event = CurationEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                recorded_by: recorded_by.to_owned(),
                occurred_at: clock.now(),
            },
            kind,
        };
        self.uncommitted_events.push(event);
    }

    /// Registers an uploaded image. New images start unselected with an
    /// empty comment.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a reused image id.
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        &mut self,
        image_id: Uuid,
        section_id: Option<Uuid>,
        storage_key: &str,
        image_url: &str,
        correlation_id: Uuid,
        uploaded_by: &str,
        uploader_name: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.image(image_id).is_some() {
            return Err(DomainError::Validation(format!(
                "image {image_id} already exists"
            )));
        }
        self.record(
            CurationEventKind::ImageSubmitted(ImageSubmitted {
                project_id: self.project_id,
                image_id,
                section_id,
                uploaded_by: uploaded_by.to_owned(),
                uploader_name: uploader_name.map(str::to_owned),
                storage_key: storage_key.to_owned(),
                image_url: image_url.to_owned(),
            }),
            correlation_id,
            uploaded_by,
            clock,
        );
        Ok(())
    }

    /// Sets section assignment and adoption flag together. Returns `false`
    /// when both already hold the requested values.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown image and
    /// `DomainError::Validation` when selecting an image without a section.
    pub fn set_selection(
        &mut self,
        image_id: Uuid,
        section_id: Option<Uuid>,
        is_selected: bool,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        let image = self.existing(image_id)?;
        if is_selected && section_id.is_none() {
            return Err(DomainError::Validation(
                "an image must be assigned to a section to be selected".to_owned(),
            ));
        }
        if image.section_id == section_id && image.is_selected == is_selected {
            return Ok(false);
        }
        self.record(
            CurationEventKind::ImageSelectionChanged(ImageSelectionChanged {
                project_id: self.project_id,
                image_id,
                section_id,
                is_selected,
            }),
            correlation_id,
            recorded_by,
            clock,
        );
        Ok(true)
    }

    /// Replaces an image's comment. Returns `false` when unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown image.
    pub fn set_comment(
        &mut self,
        image_id: Uuid,
        comment: &str,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        if self.existing(image_id)?.comment == comment {
            return Ok(false);
        }
        self.record(
            CurationEventKind::ImageCommented(ImageCommented {
                project_id: self.project_id,
                image_id,
                comment: comment.to_owned(),
            }),
            correlation_id,
            recorded_by,
            clock,
        );
        Ok(true)
    }

    /// Removes an image from the pool.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown image.
    pub fn delete(
        &mut self,
        image_id: Uuid,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.existing(image_id)?;
        self.record(
            CurationEventKind::ImageDeleted(ImageDeleted {
                project_id: self.project_id,
                image_id,
            }),
            correlation_id,
            recorded_by,
            clock,
        );
        Ok(())
    }
}

impl AggregateRoot for ImagePool {
    type Event = CurationEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        let at = event.metadata.occurred_at;
        match &event.kind {
            CurationEventKind::ImageSubmitted(payload) => {
                self.images.push(Image {
                    id: payload.image_id,
                    section_id: payload.section_id,
                    uploaded_by: payload.uploaded_by.clone(),
                    uploader_name: payload.uploader_name.clone(),
                    storage_key: payload.storage_key.clone(),
                    image_url: payload.image_url.clone(),
                    is_selected: false,
                    comment: String::new(),
                    created_at: at,
                    updated_at: at,
                });
            }
            CurationEventKind::ImageSelectionChanged(payload) => {
                if let Some(image) = self.images.iter_mut().find(|i| i.id == payload.image_id) {
                    image.section_id = payload.section_id;
                    image.is_selected = payload.is_selected;
                    image.updated_at = at;
                }
            }
            CurationEventKind::ImageCommented(payload) => {
                if let Some(image) = self.images.iter_mut().find(|i| i.id == payload.image_id) {
                    image.comment.clone_from(&payload.comment);
                    image.updated_at = at;
                }
            }
            CurationEventKind::ImageDeleted(payload) => {
                self.images.retain(|i| i.id != payload.image_id);
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
