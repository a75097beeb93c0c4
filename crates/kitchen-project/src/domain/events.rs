//! Domain events for the Project context.

use kitchen_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::phase::Phase;

/// Emitted when a project is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCreated {
    /// The project identifier.
    pub project_id: Uuid,
    /// Trimmed, non-empty title.
    pub title: String,
    /// Free-form description (may be empty).
    pub description: String,
    /// Creator, or `anonymous`.
    pub owner_id: String,
}

/// Emitted when the project moves to another phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransitioned {
    /// The project identifier.
    pub project_id: Uuid,
    /// Phase before the transition.
    pub from: Phase,
    /// Phase after the transition.
    pub to: Phase,
}

/// Emitted when a project is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDeleted {
    /// The project identifier.
    pub project_id: Uuid,
}

/// Event type identifier for [`ProjectCreated`].
pub const PROJECT_CREATED_EVENT_TYPE: &str = "project.created";

/// Event type identifier for [`PhaseTransitioned`].
pub const PHASE_TRANSITIONED_EVENT_TYPE: &str = "project.phase_transitioned";

/// Event type identifier for [`ProjectDeleted`].
pub const PROJECT_DELETED_EVENT_TYPE: &str = "project.deleted";

/// Event payload variants for the Project context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProjectEventKind {
    /// A project has been created.
    ProjectCreated(ProjectCreated),
    /// The phase has changed.
    PhaseTransitioned(PhaseTransitioned),
    /// The project has been deleted.
    ProjectDeleted(ProjectDeleted),
}

impl ProjectEventKind {
    /// The event type identifier of this payload.
    pub(crate) fn event_type(&self) -> &'static str {
        match self {
            Self::ProjectCreated(_) => PROJECT_CREATED_EVENT_TYPE,
            Self::PhaseTransitioned(_) => PHASE_TRANSITIONED_EVENT_TYPE,
            Self::ProjectDeleted(_) => PROJECT_DELETED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Project context.
#[derive(Debug, Clone)]
pub struct ProjectEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ProjectEventKind,
}

impl DomainEvent for ProjectEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("ProjectEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

/// Emitted when a project enters the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectListed {
    /// The listed project.
    pub project_id: Uuid,
}

/// Emitted when a deleted project leaves the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectUnlisted {
    /// The removed project.
    pub project_id: Uuid,
}

/// Event type identifier for [`ProjectListed`].
pub const PROJECT_LISTED_EVENT_TYPE: &str = "directory.project_listed";

/// Event type identifier for [`ProjectUnlisted`].
pub const PROJECT_UNLISTED_EVENT_TYPE: &str = "directory.project_unlisted";

/// Event payload variants for the project directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DirectoryEventKind {
    /// A project was listed.
    ProjectListed(ProjectListed),
    /// A project was removed from the listing.
    ProjectUnlisted(ProjectUnlisted),
}

impl DirectoryEventKind {
    pub(crate) fn event_type(&self) -> &'static str {
        match self {
            Self::ProjectListed(_) => PROJECT_LISTED_EVENT_TYPE,
            Self::ProjectUnlisted(_) => PROJECT_UNLISTED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the project directory.
#[derive(Debug, Clone)]
pub struct DirectoryEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: DirectoryEventKind,
}

impl DomainEvent for DirectoryEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(&self.kind).expect("DirectoryEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
