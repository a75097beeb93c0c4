//! Domain events for the Script context.

use kitchen_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted first by an import: every existing section is dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptCleared {
    /// The project identifier.
    pub project_id: Uuid,
}

/// One section created by an import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedSection {
    /// New section identifier.
    pub section_id: Uuid,
    /// Trimmed block text.
    pub content: String,
}

/// A batch of imported sections, appended at the end of the sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionsImported {
    /// The project identifier.
    pub project_id: Uuid,
    /// Index of the first section in this batch.
    pub start_index: usize,
    /// Sections in order.
    pub sections: Vec<ImportedSection>,
}

/// Emitted when a section is inserted; later sections shift by one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionInserted {
    /// The project identifier.
    pub project_id: Uuid,
    /// New section identifier.
    pub section_id: Uuid,
    /// Position of the new section.
    pub index: usize,
    /// Initial content.
    pub content: String,
}

/// Emitted when a section is deleted; later sections shift back by one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDeleted {
    /// The project identifier.
    pub project_id: Uuid,
    /// The removed section.
    pub section_id: Uuid,
    /// Position it held.
    pub index: usize,
}

/// Partial edit of a section. Absent fields are untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionUpdated {
    /// The project identifier.
    pub project_id: Uuid,
    /// The edited section.
    pub section_id: Uuid,
    /// New body text.
    pub content: Option<String>,
    /// New image instruction.
    pub image_instruction: Option<String>,
    /// New submission flag.
    pub allow_image_submission: Option<bool>,
    /// New reference URLs, as their JSON serialization.
    pub reference_image_urls: Option<String>,
}

/// Emitted when an approved proposal overwrites a section's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionContentReplaced {
    /// The project identifier.
    pub project_id: Uuid,
    /// The overwritten section.
    pub section_id: Uuid,
    /// The proposal whose text was adopted.
    pub proposal_id: Uuid,
    /// The adopted text.
    pub content: String,
}

/// Emitted when the whole sequence is reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionsReordered {
    /// The project identifier.
    pub project_id: Uuid,
    /// Every section id in its new order.
    pub section_ids: Vec<Uuid>,
}

/// Event type identifier for [`ScriptCleared`].
pub const SCRIPT_CLEARED_EVENT_TYPE: &str = "script.cleared";

/// Event type identifier for [`SectionsImported`].
pub const SECTIONS_IMPORTED_EVENT_TYPE: &str = "script.sections_imported";

/// Event type identifier for [`SectionInserted`].
pub const SECTION_INSERTED_EVENT_TYPE: &str = "script.section_inserted";

/// Event type identifier for [`SectionDeleted`].
pub const SECTION_DELETED_EVENT_TYPE: &str = "script.section_deleted";

/// Event type identifier for [`SectionUpdated`].
pub const SECTION_UPDATED_EVENT_TYPE: &str = "script.section_updated";

/// Event type identifier for [`SectionContentReplaced`].
pub const SECTION_CONTENT_REPLACED_EVENT_TYPE: &str = "script.section_content_replaced";

/// Event type identifier for [`SectionsReordered`].
pub const SECTIONS_REORDERED_EVENT_TYPE: &str = "script.sections_reordered";

/// Event payload variants for the Script context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScriptEventKind {
    /// All sections dropped ahead of an import.
    ScriptCleared(ScriptCleared),
    /// A batch of imported sections.
    SectionsImported(SectionsImported),
    /// A section was inserted.
    SectionInserted(SectionInserted),
    /// A section was deleted.
    SectionDeleted(SectionDeleted),
    /// A section was edited.
    SectionUpdated(SectionUpdated),
    /// A proposal's text was adopted.
    SectionContentReplaced(SectionContentReplaced),
    /// The sequence was reordered.
    SectionsReordered(SectionsReordered),
}

impl ScriptEventKind {
    pub(crate) fn event_type(&self) -> &'static str {
        match self {
            Self::ScriptCleared(_) => SCRIPT_CLEARED_EVENT_TYPE,
            Self::SectionsImported(_) => SECTIONS_IMPORTED_EVENT_TYPE,
            Self::SectionInserted(_) => SECTION_INSERTED_EVENT_TYPE,
            Self::SectionDeleted(_) => SECTION_DELETED_EVENT_TYPE,
            Self::SectionUpdated(_) => SECTION_UPDATED_EVENT_TYPE,
            Self::SectionContentReplaced(_) => SECTION_CONTENT_REPLACED_EVENT_TYPE,
            Self::SectionsReordered(_) => SECTIONS_REORDERED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Script context.
#[derive(Debug, Clone)]
pub struct ScriptEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ScriptEventKind,
}

impl DomainEvent for ScriptEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("ScriptEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
