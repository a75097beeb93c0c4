//! Commands for the Presence context.

use kitchen_core::access::Actor;
use kitchen_core::command::Command;
use uuid::Uuid;

use super::presence::PresenceStatus;

/// Command to report that the actor is looking at a project.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// New status, or `None` to keep the current one.
    pub status: Option<PresenceStatus>,
    /// Name to show for the actor, or `None` to keep the current one.
    pub display_name: Option<String>,
    /// Who is reporting; must carry a session.
    pub actor: Actor,
}

impl Command for Heartbeat {
    fn command_type(&self) -> &'static str {
        "presence.heartbeat"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}
