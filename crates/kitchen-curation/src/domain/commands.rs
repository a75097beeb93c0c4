//! Commands for the Curation context.

use kitchen_core::access::Actor;
use kitchen_core::command::Command;
use uuid::Uuid;

/// Command to mint a signed upload target. Produces no events.
#[derive(Debug, Clone)]
pub struct RequestUploadSlot {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// Client-side filename; only its extension is used.
    pub filename: String,
    /// MIME type the client will upload.
    pub content_type: String,
    /// Who is asking; must carry a session.
    pub actor: Actor,
}

impl Command for RequestUploadSlot {
    fn command_type(&self) -> &'static str {
        "curation.request_upload_slot"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to register an image after its upload finished.
#[derive(Debug, Clone)]
pub struct ConfirmUpload {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// Identifier chosen for the new image.
    pub image_id: Uuid,
    /// Key the object was uploaded under.
    pub storage_key: String,
    /// Section the image is for, if already chosen.
    pub section_id: Option<Uuid>,
    /// Display name to file the image under.
    pub uploader_name: Option<String>,
    /// The uploader.
    pub actor: Actor,
}

impl Command for ConfirmUpload {
    fn command_type(&self) -> &'static str {
        "curation.confirm_upload"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to set an image's section and adoption flag in one write.
#[derive(Debug, Clone)]
pub struct SetImageSelection {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// The image identifier.
    pub image_id: Uuid,
    /// Section to assign, or `None` to detach.
    pub section_id: Option<Uuid>,
    /// Adoption flag.
    pub is_selected: bool,
    /// Who is asking.
    pub actor: Actor,
}

impl Command for SetImageSelection {
    fn command_type(&self) -> &'static str {
        "curation.set_selection"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to edit an image's comment.
#[derive(Debug, Clone)]
pub struct SetImageComment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// The image identifier.
    pub image_id: Uuid,
    /// The new comment.
    pub comment: String,
    /// Who is asking; uploader or privileged.
    pub actor: Actor,
}

impl Command for SetImageComment {
    fn command_type(&self) -> &'static str {
        "curation.set_comment"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to remove an image.
#[derive(Debug, Clone)]
pub struct DeleteImage {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// The image identifier.
    pub image_id: Uuid,
    /// Who is asking; uploader or privileged.
    pub actor: Actor,
}

impl Command for DeleteImage {
    fn command_type(&self) -> &'static str {
        "curation.delete_image"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}
