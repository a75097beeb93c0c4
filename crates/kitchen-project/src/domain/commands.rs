//! Commands for the Project context.

use kitchen_core::access::Actor;
use kitchen_core::command::Command;
use uuid::Uuid;

use super::phase::Phase;

/// Command to create a new project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identifier chosen for the new project.
    pub project_id: Uuid,
    /// Project title; must not be blank.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// The creator (may be anonymous).
    pub actor: Actor,
}

impl Command for CreateProject {
    fn command_type(&self) -> &'static str {
        "project.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to move a project to another phase.
#[derive(Debug, Clone)]
pub struct TransitionPhase {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// Requested phase.
    pub target: Phase,
    /// Who is asking.
    pub actor: Actor,
}

impl Command for TransitionPhase {
    fn command_type(&self) -> &'static str {
        "project.transition_phase"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to delete a project.
#[derive(Debug, Clone)]
pub struct DeleteProject {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// Who is asking.
    pub actor: Actor,
}

impl Command for DeleteProject {
    fn command_type(&self) -> &'static str {
        "project.delete"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}
