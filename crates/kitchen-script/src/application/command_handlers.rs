//! Command handlers for the Script context.
//!
//! Every handler first passes the project's role and phase gate, then
//! loads the project's script stream, runs the domain operation and appends
//! the resulting events in one call. Field edits are re-applied on a fresh
//! load when another write lands first; structural edits (import, insert,
//! delete, reorder) fail with `ConcurrencyConflict` instead.

use kitchen_core::access::{Actor, Operation};
use kitchen_core::aggregate::AggregateRoot;
use kitchen_core::clock::Clock;
use kitchen_core::command::Command;
use kitchen_core::error::DomainError;
use kitchen_core::event::EventMetadata;
use kitchen_core::repository::{EventRepository, StoredEvent, retry_on_conflict};
use kitchen_core::stream::ProjectStream;
use kitchen_project::application::command_handlers::{ProjectCommandResult, handle_create_project};
use kitchen_project::application::query_handlers::authorize_operation;
use kitchen_project::domain::commands::CreateProject;
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::{Script, SectionChanges};
use crate::domain::commands::{
    DeleteSection, ImportScript, InsertSection, ReorderSections, ReplaceSectionContent,
    UpdateSection,
};
use crate::domain::events::{ScriptEvent, ScriptEventKind};
use crate::domain::import::split_script;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct ScriptCommandResult {
    /// The script stream affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes a project's `Script` from its stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    project_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Script, DomainError> {
    let mut script = Script::new(project_id);
    for stored in existing_events {
        let kind: ScriptEventKind =
            serde_json::from_value(stored.payload.clone()).map_err(|e| {
                DomainError::Infrastructure(format!("event deserialization failed: {e}"))
            })?;
        let event = ScriptEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        script.apply(&event);
    }
    Ok(script)
}

/// Loads the script of `project_id`. A project without sections has an
/// empty stream, which is a valid empty script.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage or decoding failures.
pub(crate) async fn load_script(
    project_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Script, DomainError> {
    let stream_id = ProjectStream::Script.id_for(project_id);
    let existing_events = repo.load_events(stream_id).await?;
    reconstitute(project_id, &existing_events)
}

async fn persist(
    script: &Script,
    repo: &dyn EventRepository,
) -> Result<ScriptCommandResult, DomainError> {
    let stored_events = script.pending_stored_events();
    if !stored_events.is_empty() {
        repo.append_events(script.id, script.version(), &stored_events)
            .await?;
    }
    Ok(ScriptCommandResult {
        aggregate_id: script.id,
        stored_events,
    })
}

async fn import_blocks(
    project_id: Uuid,
    raw_text: &str,
    correlation_id: Uuid,
    actor: &Actor,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ScriptCommandResult, DomainError> {
    let mut script = load_script(project_id, repo).await?;
    let replaced = script.sections.len();
    let count = script.import(split_script(raw_text), correlation_id, &actor.user_id, clock);

    info!(
        %project_id,
        %correlation_id,
        replaced,
        imported = count,
        "script imported"
    );

    persist(&script, repo).await
}

/// Handles the `ImportScript` command: every existing section is replaced
/// by the blocks of the raw text. A script with no blocks clears the
/// project.
///
/// # Errors
///
/// Returns `DomainError` if the project is missing, the actor may not
/// import, or persistence fails.
pub async fn handle_import_script(
    command: &ImportScript,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ScriptCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::ImportScript, repo).await?;
    import_blocks(
        command.project_id,
        &command.raw_text,
        command.correlation_id(),
        &command.actor,
        clock,
        repo,
    )
    .await
}

/// Creates a project and seeds it with the sections of `raw_text`. The
/// creator does not need import rights for the initial seed.
///
/// # Errors
///
/// Returns `DomainError` if the title is blank or persistence fails.
pub async fn handle_create_project_with_script(
    command: &CreateProject,
    raw_text: &str,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<(ProjectCommandResult, ScriptCommandResult), DomainError> {
    let project = handle_create_project(command, clock, repo).await?;
    let script = import_blocks(
        command.project_id,
        raw_text,
        command.correlation_id,
        &command.actor,
        clock,
        repo,
    )
    .await?;
    Ok((project, script))
}

/// Handles the `InsertSection` command.
///
/// # Errors
///
/// Returns `DomainError` if the project is missing, the actor is not
/// privileged, the index is out of range, or persistence fails.
pub async fn handle_insert_section(
    command: &InsertSection,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ScriptCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::InsertSection, repo)
        .await?;
    let mut script = load_script(command.project_id, repo).await?;

    script.insert_section(
        command.section_id,
        command.index,
        command.content.clone(),
        command.correlation_id,
        &command.actor.user_id,
        clock,
    )?;

    info!(
        project_id = %command.project_id,
        section_id = %command.section_id,
        index = command.index,
        "section inserted"
    );

    persist(&script, repo).await
}

/// Handles the `DeleteSection` command.
///
/// # Errors
///
/// Returns `DomainError` if the project or section is missing, the actor is
/// not privileged, or persistence fails.
pub async fn handle_delete_section(
    command: &DeleteSection,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ScriptCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::DeleteSection, repo)
        .await?;
    let mut script = load_script(command.project_id, repo).await?;

    let index = script.delete_section(
        command.section_id,
        command.correlation_id,
        &command.actor.user_id,
        clock,
    )?;

    info!(
        project_id = %command.project_id,
        section_id = %command.section_id,
        index,
        "section deleted"
    );

    persist(&script, repo).await
}

/// Handles the `UpdateSection` command. Edits carry no version token, so a
/// later edit of the same field overwrites an earlier one.
///
/// # Errors
///
/// Returns `DomainError` if the project or section is missing, the actor is
/// not privileged, or persistence fails.
pub async fn handle_update_section(
    command: &UpdateSection,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ScriptCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::EditSection, repo).await?;

    let (result, changed) = retry_on_conflict(|| async move {
        let mut script = load_script(command.project_id, repo).await?;
        let changed = script.update_section(
            command.section_id,
            SectionChanges {
                content: command.content.clone(),
                image_instruction: command.image_instruction.clone(),
                allow_image_submission: command.allow_image_submission,
                reference_image_urls: command.reference_image_urls.clone(),
            },
            command.correlation_id,
            &command.actor.user_id,
            clock,
        )?;
        Ok::<_, DomainError>((persist(&script, repo).await?, changed))
    })
    .await?;

    info!(
        project_id = %command.project_id,
        section_id = %command.section_id,
        changed,
        "section updated"
    );

    Ok(result)
}

/// Handles the `ReplaceSectionContent` command issued when a proposal is
/// applied.
///
/// # Errors
///
/// Returns `DomainError` if the project or section is missing, the actor may
/// not review proposals, or persistence fails.
pub async fn handle_replace_section_content(
    command: &ReplaceSectionContent,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ScriptCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::ReviewProposal, repo)
        .await?;

    let result = retry_on_conflict(|| async move {
        let mut script = load_script(command.project_id, repo).await?;
        script.replace_content(
            command.section_id,
            command.proposal_id,
            command.content.clone(),
            command.correlation_id,
            &command.actor.user_id,
            clock,
        )?;
        persist(&script, repo).await
    })
    .await?;

    info!(
        project_id = %command.project_id,
        section_id = %command.section_id,
        proposal_id = %command.proposal_id,
        "section content replaced"
    );

    Ok(result)
}

/// Handles the `ReorderSections` command.
///
/// # Errors
///
/// Returns `DomainError` if the project is missing, the actor is not
/// privileged, the ids are not a permutation of the current sections, or
/// persistence fails.
pub async fn handle_reorder_sections(
    command: &ReorderSections,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ScriptCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::ReorderSections, repo)
        .await?;
    let mut script = load_script(command.project_id, repo).await?;

    let changed = script.reorder(
        command.section_ids.clone(),
        command.correlation_id,
        &command.actor.user_id,
        clock,
    )?;

    info!(project_id = %command.project_id, changed, "sections reordered");

    persist(&script, repo).await
}
