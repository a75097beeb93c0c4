//! Section edit drafts.
//!
//! A participant edits one section at a time: `start` opens a draft from
//! the section's current fields, `cancel` discards it, and `save` closes it
//! and yields the `UpdateSection` command carrying only what changed.

use kitchen_core::access::Actor;
use kitchen_core::error::DomainError;
use uuid::Uuid;

use super::commands::UpdateSection;

/// The editable fields of a section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionFields {
    /// Body text.
    pub content: String,
    /// Guidance for image contributors.
    pub image_instruction: String,
    /// Whether images may be submitted.
    pub allow_image_submission: bool,
    /// Reference image URLs.
    pub reference_image_urls: Vec<String>,
}

/// Edit state of one participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SectionDraft {
    /// Nothing is being edited.
    #[default]
    Idle,
    /// A section is open for editing.
    Editing {
        /// Owning project.
        project_id: Uuid,
        /// The section being edited.
        section_id: Uuid,
        /// Fields when editing started.
        original: SectionFields,
        /// Fields as edited so far.
        fields: SectionFields,
    },
}

impl SectionDraft {
    /// Opens a draft. Starting while another section is open discards the
    /// previous draft.
    #[must_use]
    pub fn start(project_id: Uuid, section_id: Uuid, current: SectionFields) -> Self {
        Self::Editing {
            project_id,
            section_id,
            original: current.clone(),
            fields: current,
        }
    }

    /// The section being edited, if any.
    #[must_use]
    pub fn section_id(&self) -> Option<Uuid> {
        match self {
            Self::Idle => None,
            Self::Editing { section_id, .. } => Some(*section_id),
        }
    }

    /// Mutable access to the fields being edited.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when no draft is open.
    pub fn fields_mut(&mut self) -> Result<&mut SectionFields, DomainError> {
        match self {
            Self::Idle => Err(DomainError::Validation("no section is being edited".to_owned())),
            Self::Editing { fields, .. } => Ok(fields),
        }
    }

    /// Discards the draft.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Closes the draft. Returns the command to send, or `None` when
    /// nothing changed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when no draft is open.
    pub fn save(
        &mut self,
        actor: Actor,
        correlation_id: Uuid,
    ) -> Result<Option<UpdateSection>, DomainError> {
        let Self::Editing {
            project_id,
            section_id,
            original,
            fields,
        } = std::mem::take(self)
        else {
            return Err(DomainError::Validation(
                "no section is being edited".to_owned(),
            ));
        };

        let command = UpdateSection {
            correlation_id,
            project_id,
            section_id,
            content: (fields.content != original.content).then_some(fields.content),
            image_instruction: (fields.image_instruction != original.image_instruction)
                .then_some(fields.image_instruction),
            allow_image_submission: (fields.allow_image_submission
                != original.allow_image_submission)
                .then_some(fields.allow_image_submission),
            reference_image_urls: (fields.reference_image_urls != original.reference_image_urls)
                .then_some(fields.reference_image_urls),
            actor,
        };
        Ok((!command.is_empty()).then_some(command))
    }
}
