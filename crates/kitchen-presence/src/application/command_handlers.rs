//! Command handlers for the Presence context.

use kitchen_core::access::Operation;
use kitchen_core::clock::Clock;
use kitchen_core::error::DomainError;
use kitchen_core::repository::EventRepository;
use kitchen_project::application::query_handlers::authorize_operation;
use tracing::debug;

use crate::domain::commands::Heartbeat;
use crate::domain::presence::PresenceRecord;
use crate::domain::repository::PresenceRepository;

/// Handles the `Heartbeat` command. Callers are expected to send one every
/// minute and whenever their status changes; nothing here schedules them.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` without a session,
/// `DomainError::AggregateNotFound` for a missing project, and storage
/// errors from either repository.
pub async fn handle_heartbeat(
    command: &Heartbeat,
    clock: &dyn Clock,
    presence: &dyn PresenceRepository,
    repo: &dyn EventRepository,
) -> Result<PresenceRecord, DomainError> {
    command.actor.require_session()?;
    authorize_operation(command.project_id, &command.actor, Operation::Heartbeat, repo).await?;

    let record = presence
        .upsert(
            command.project_id,
            &command.actor.user_id,
            command.status,
            command.display_name.as_deref(),
            clock.now(),
        )
        .await?;

    debug!(
        project_id = %command.project_id,
        user_id = %record.user_id,
        status = %record.status,
        "heartbeat recorded"
    );

    Ok(record)
}
