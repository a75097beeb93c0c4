//! Commands for the Script context.

use kitchen_core::access::Actor;
use kitchen_core::command::Command;
use uuid::Uuid;

/// Command to replace every section with the blocks of a raw script.
#[derive(Debug, Clone)]
pub struct ImportScript {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// Raw script text; blocks are separated by blank lines.
    pub raw_text: String,
    /// Who is asking.
    pub actor: Actor,
}

impl Command for ImportScript {
    fn command_type(&self) -> &'static str {
        "script.import"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to insert a section at an index.
#[derive(Debug, Clone)]
pub struct InsertSection {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// Identifier chosen for the new section.
    pub section_id: Uuid,
    /// Target position; equal to the section count appends.
    pub index: usize,
    /// Initial content, usually empty.
    pub content: String,
    /// Who is asking.
    pub actor: Actor,
}

impl Command for InsertSection {
    fn command_type(&self) -> &'static str {
        "script.insert_section"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to delete a section and close the gap.
#[derive(Debug, Clone)]
pub struct DeleteSection {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// The section to delete.
    pub section_id: Uuid,
    /// Who is asking.
    pub actor: Actor,
}

impl Command for DeleteSection {
    fn command_type(&self) -> &'static str {
        "script.delete_section"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to edit a section. Only the provided fields are written.
#[derive(Debug, Clone)]
pub struct UpdateSection {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// The section to edit.
    pub section_id: Uuid,
    /// New body text.
    pub content: Option<String>,
    /// New image instruction.
    pub image_instruction: Option<String>,
    /// New submission flag.
    pub allow_image_submission: Option<bool>,
    /// New reference image URLs.
    pub reference_image_urls: Option<Vec<String>>,
    /// Who is asking.
    pub actor: Actor,
}

impl UpdateSection {
    /// True when no field would be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.image_instruction.is_none()
            && self.allow_image_submission.is_none()
            && self.reference_image_urls.is_none()
    }
}

impl Command for UpdateSection {
    fn command_type(&self) -> &'static str {
        "script.update_section"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to overwrite a section's content with an approved proposal.
#[derive(Debug, Clone)]
pub struct ReplaceSectionContent {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// The section to overwrite.
    pub section_id: Uuid,
    /// The proposal being applied.
    pub proposal_id: Uuid,
    /// The proposed text.
    pub content: String,
    /// The reviewer.
    pub actor: Actor,
}

impl Command for ReplaceSectionContent {
    fn command_type(&self) -> &'static str {
        "script.replace_section_content"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to reorder the whole sequence.
#[derive(Debug, Clone)]
pub struct ReorderSections {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// Every current section id, in the desired order.
    pub section_ids: Vec<Uuid>,
    /// Who is asking.
    pub actor: Actor,
}

impl Command for ReorderSections {
    fn command_type(&self) -> &'static str {
        "script.reorder_sections"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}
