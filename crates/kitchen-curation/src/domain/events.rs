//! Domain events for the Curation context.

use kitchen_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when an uploaded image is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSubmitted {
    /// The project identifier.
    pub project_id: Uuid,
    /// The image identifier.
    pub image_id: Uuid,
    /// Section the image was uploaded for, if chosen.
    pub section_id: Option<Uuid>,
    /// Uploader, or `anonymous`.
    pub uploaded_by: String,
    /// The uploader's display name at submission time.
    #[serde(default)]
    pub uploader_name: Option<String>,
    /// Storage key of the object.
    pub storage_key: String,
    /// Public URL of the object.
    pub image_url: String,
}

/// Emitted when an image's section or adoption flag changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSelectionChanged {
    /// The project identifier.
    pub project_id: Uuid,
    /// The image identifier.
    pub image_id: Uuid,
    /// New section assignment.
    pub section_id: Option<Uuid>,
    /// New adoption flag.
    pub is_selected: bool,
}

/// Emitted when an image's comment is edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCommented {
    /// The project identifier.
    pub project_id: Uuid,
    /// The image identifier.
    pub image_id: Uuid,
    /// The new comment.
    pub comment: String,
}

/// Emitted when an image is removed. The stored object is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDeleted {
    /// The project identifier.
    pub project_id: Uuid,
    /// The image identifier.
    pub image_id: Uuid,
}

/// Event type identifier for [`ImageSubmitted`].
pub const IMAGE_SUBMITTED_EVENT_TYPE: &str = "curation.image_submitted";

/// Event type identifier for [`ImageSelectionChanged`].
pub const IMAGE_SELECTION_CHANGED_EVENT_TYPE: &str = "curation.image_selection_changed";

/// Event type identifier for [`ImageCommented`].
pub const IMAGE_COMMENTED_EVENT_TYPE: &str = "curation.image_commented";

/// Event type identifier for [`ImageDeleted`].
pub const IMAGE_DELETED_EVENT_TYPE: &str = "curation.image_deleted";

/// Event payload variants for the Curation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CurationEventKind {
    /// An image was registered.
    ImageSubmitted(ImageSubmitted),
    /// Section or adoption flag changed.
    ImageSelectionChanged(ImageSelectionChanged),
    /// Comment edited.
    ImageCommented(ImageCommented),
    /// Image removed.
    ImageDeleted(ImageDeleted),
}

impl CurationEventKind {
    pub(crate) fn event_type(&self) -> &'static str {
        match self {
            Self::ImageSubmitted(_) => IMAGE_SUBMITTED_EVENT_TYPE,
            Self::ImageSelectionChanged(_) => IMAGE_SELECTION_CHANGED_EVENT_TYPE,
            Self::ImageCommented(_) => IMAGE_COMMENTED_EVENT_TYPE,
            Self::ImageDeleted(_) => IMAGE_DELETED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Curation context.
#[derive(Debug, Clone)]
pub struct CurationEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: CurationEventKind,
}

impl DomainEvent for CurationEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("CurationEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
