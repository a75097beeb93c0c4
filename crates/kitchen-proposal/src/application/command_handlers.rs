//! Command handlers for the Proposal context.

use kitchen_core::access::Operation;
use kitchen_core::aggregate::AggregateRoot;
use kitchen_core::clock::Clock;
use kitchen_core::error::DomainError;
use kitchen_core::event::EventMetadata;
use kitchen_core::repository::{EventRepository, StoredEvent, retry_on_conflict};
use kitchen_core::stream::ProjectStream;
use kitchen_project::application::query_handlers::authorize_operation;
use kitchen_script::application::command_handlers::handle_replace_section_content;
use kitchen_script::application::query_handlers::get_section;
use kitchen_script::domain::commands::ReplaceSectionContent;
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::ProposalBoard;
use crate::domain::commands::{ApplyProposal, SetProposalStatus, SubmitProposal};
use crate::domain::events::{ProposalEvent, ProposalEventKind, ProposalStatus};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct ProposalCommandResult {
    /// The proposal board stream affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes a project's `ProposalBoard` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    project_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<ProposalBoard, DomainError> {
    let mut board = ProposalBoard::new(project_id);
    for stored in existing_events {
        let kind: ProposalEventKind =
            serde_json::from_value(stored.payload.clone()).map_err(|e| {
                DomainError::Infrastructure(format!("event deserialization failed: {e}"))
            })?;
        let event = ProposalEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        board.apply(&event);
    }
    Ok(board)
}

/// Loads the proposal board of `project_id`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage or decoding failures.
pub(crate) async fn load_board(
    project_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<ProposalBoard, DomainError> {
    let stream_id = ProjectStream::ProposalBoard.id_for(project_id);
    let existing_events = repo.load_events(stream_id).await?;
    reconstitute(project_id, &existing_events)
}

async fn persist(
    board: &ProposalBoard,
    repo: &dyn EventRepository,
) -> Result<ProposalCommandResult, DomainError> {
    let stored_events = board.pending_stored_events();
    if !stored_events.is_empty() {
        repo.append_events(board.id, board.version(), &stored_events)
            .await?;
    }
    Ok(ProposalCommandResult {
        aggregate_id: board.id,
        stored_events,
    })
}

/// Handles the `SubmitProposal` command.
///
/// # Errors
///
/// Returns `DomainError` if the project or section is missing, proposals are
/// closed for the actor, the text is blank, or persistence fails.
pub async fn handle_submit_proposal(
    command: &SubmitProposal,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ProposalCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::SubmitProposal, repo)
        .await?;
    get_section(command.project_id, command.section_id, repo).await?;

    let result = retry_on_conflict(|| async move {
        let mut board = load_board(command.project_id, repo).await?;
        board.submit(
            command.proposal_id,
            command.section_id,
            &command.proposed_content,
            command.correlation_id,
            &command.actor.user_id,
            clock,
        )?;
        persist(&board, repo).await
    })
    .await?;

    info!(
        project_id = %command.project_id,
        section_id = %command.section_id,
        proposal_id = %command.proposal_id,
        proposed_by = %command.actor.user_id,
        "proposal submitted"
    );

    Ok(result)
}

/// Handles the `SetProposalStatus` command. Only rejection is a direct
/// status write.
///
/// # Errors
///
/// Returns `DomainError::Validation` for any status other than `rejected`
/// or a proposal that is no longer pending, `DomainError::NotFound` for an
/// unknown proposal, and the usual gate and persistence errors.
pub async fn handle_set_proposal_status(
    command: &SetProposalStatus,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ProposalCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::ReviewProposal, repo)
        .await?;
    if command.status != ProposalStatus::Rejected {
        return Err(DomainError::Validation(format!(
            "status {} cannot be set directly; approve by applying the proposal",
            command.status
        )));
    }
    let result = retry_on_conflict(|| async move {
        let mut board = load_board(command.project_id, repo).await?;
        board.reject(
            command.proposal_id,
            command.correlation_id,
            &command.actor.user_id,
            clock,
        )?;
        persist(&board, repo).await
    })
    .await?;

    info!(
        project_id = %command.project_id,
        proposal_id = %command.proposal_id,
        "proposal rejected"
    );

    Ok(result)
}

/// Handles the `ApplyProposal` command: the proposed text is written into
/// the section, then the proposal is marked approved.
///
/// The two writes go to different streams and each is re-applied on a fresh
/// load when another write lands first. If the approval still fails, the
/// section already carries the new text while the proposal is pending;
/// re-applying converges.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown proposal or a deleted
/// section, `DomainError::Validation` if the proposal is not pending, and
/// the usual gate and persistence errors.
pub async fn handle_apply_proposal(
    command: &ApplyProposal,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ProposalCommandResult, DomainError> {
    authorize_operation(command.project_id, &command.actor, Operation::ReviewProposal, repo)
        .await?;
    let proposal = load_board(command.project_id, repo)
        .await?
        .pending(command.proposal_id)?
        .clone();

    handle_replace_section_content(
        &ReplaceSectionContent {
            correlation_id: command.correlation_id,
            project_id: command.project_id,
            section_id: proposal.section_id,
            proposal_id: proposal.id,
            content: proposal.proposed_content,
            actor: command.actor.clone(),
        },
        clock,
        repo,
    )
    .await?;

    let result = retry_on_conflict(|| async move {
        let mut board = load_board(command.project_id, repo).await?;
        board.approve(
            command.proposal_id,
            command.correlation_id,
            &command.actor.user_id,
            clock,
        )?;
        persist(&board, repo).await
    })
    .await?;

    info!(
        project_id = %command.project_id,
        section_id = %proposal.section_id,
        proposal_id = %command.proposal_id,
        "proposal applied"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use kitchen_core::access::{Actor, Role};
    use kitchen_core::error::DomainError;
    use kitchen_project::application::command_handlers::handle_transition_phase;
    use kitchen_project::domain::commands::{CreateProject, TransitionPhase};
    use kitchen_project::domain::phase::Phase;
    use kitchen_script::application::command_handlers::handle_create_project_with_script;
    use kitchen_script::application::query_handlers::list_ordered;
    use kitchen_test_support::{FixedClock, InMemoryEventRepository, InterleavingEventRepository};
    use uuid::Uuid;

    use super::*;
    use crate::application::query_handlers::get_proposal;

    fn chair() -> Actor {
        Actor::new("carol", Role::Owner)
    }

    fn member() -> Actor {
        Actor::new("alice", Role::Member)
    }

    async fn seeded(repo: &InMemoryEventRepository) -> (Uuid, Uuid) {
        let project_id = Uuid::new_v4();
        handle_create_project_with_script(
            &CreateProject {
                correlation_id: Uuid::new_v4(),
                project_id,
                title: "Curry night".to_owned(),
                description: None,
                actor: chair(),
            },
            "Intro\n\nMain",
            &FixedClock::at_fixed_now(),
            repo,
        )
        .await
        .unwrap();
        let section_id = list_ordered(project_id, repo).await.unwrap()[0].section_id;
        (project_id, section_id)
    }

    async fn submit(
        repo: &InMemoryEventRepository,
        project_id: Uuid,
        section_id: Uuid,
        text: &str,
    ) -> Uuid {
        let proposal_id = Uuid::new_v4();
        handle_submit_proposal(
            &SubmitProposal {
                correlation_id: Uuid::new_v4(),
                project_id,
                proposal_id,
                section_id,
                proposed_content: text.to_owned(),
                actor: member(),
            },
            &FixedClock::at_fixed_now(),
            repo,
        )
        .await
        .unwrap();
        proposal_id
    }

    fn apply(project_id: Uuid, proposal_id: Uuid) -> ApplyProposal {
        ApplyProposal {
            correlation_id: Uuid::new_v4(),
            project_id,
            proposal_id,
            actor: chair(),
        }
    }

    #[tokio::test]
    async fn test_apply_overwrites_section_and_approves() {
        // Arrange
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let (project_id, section_id) = seeded(&repo).await;
        let proposal_id = submit(&repo, project_id, section_id, "A sharper intro").await;

        // Act
        handle_apply_proposal(&apply(project_id, proposal_id), &clock, &repo)
            .await
            .unwrap();

        // Assert
        let section = &list_ordered(project_id, &repo).await.unwrap()[0];
        assert_eq!(section.content, "A sharper intro");
        let proposal = get_proposal(project_id, proposal_id, &repo).await.unwrap();
        assert_eq!(proposal.status, ProposalStatus::Approved);
    }

    /// A board write by bob that lands on top of what the caller loads.
    async fn rival_submission(
        repo: &InMemoryEventRepository,
        project_id: Uuid,
        section_id: Uuid,
    ) -> (Uuid, Vec<StoredEvent>) {
        let proposal_id = Uuid::new_v4();
        let mut board = load_board(project_id, repo).await.unwrap();
        board
            .submit(
                proposal_id,
                section_id,
                "Bob's intro",
                Uuid::new_v4(),
                "bob",
                &FixedClock::at_fixed_now(),
            )
            .unwrap();
        (proposal_id, board.pending_stored_events())
    }

    #[tokio::test]
    async fn test_submission_lands_beside_a_concurrent_submission() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let (project_id, section_id) = seeded(&repo).await;
        let (bobs, rival) = rival_submission(&repo, project_id, section_id).await;
        let racing = InterleavingEventRepository::new(&repo, rival);
        let alices = Uuid::new_v4();

        // Act
        let result = handle_submit_proposal(
            &SubmitProposal {
                correlation_id: Uuid::new_v4(),
                project_id,
                proposal_id: alices,
                section_id,
                proposed_content: "Alice's intro".to_owned(),
                actor: member(),
            },
            &FixedClock::at_fixed_now(),
            &racing,
        )
        .await;

        // Assert
        assert!(result.is_ok());
        assert!(racing.rival_landed());
        assert!(get_proposal(project_id, bobs, &repo).await.is_ok());
        assert!(get_proposal(project_id, alices, &repo).await.is_ok());
    }

    #[tokio::test]
    async fn test_apply_approves_despite_a_concurrent_submission() {
        // Arrange
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let (project_id, section_id) = seeded(&repo).await;
        let proposal_id = submit(&repo, project_id, section_id, "A sharper intro").await;
        let (bobs, rival) = rival_submission(&repo, project_id, section_id).await;
        let racing = InterleavingEventRepository::new(&repo, rival);

        // Act
        let result = handle_apply_proposal(&apply(project_id, proposal_id), &clock, &racing).await;

        // Assert
        assert!(result.is_ok());
        let applied = get_proposal(project_id, proposal_id, &repo).await.unwrap();
        assert_eq!(applied.status, ProposalStatus::Approved);
        let pending = get_proposal(project_id, bobs, &repo).await.unwrap();
        assert_eq!(pending.status, ProposalStatus::Pending);
        let section = &list_ordered(project_id, &repo).await.unwrap()[0];
        assert_eq!(section.content, "A sharper intro");
    }

    #[tokio::test]
    async fn test_apply_twice_is_rejected_as_not_pending() {
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let (project_id, section_id) = seeded(&repo).await;
        let proposal_id = submit(&repo, project_id, section_id, "A sharper intro").await;
        handle_apply_proposal(&apply(project_id, proposal_id), &clock, &repo)
            .await
            .unwrap();

        let result = handle_apply_proposal(&apply(project_id, proposal_id), &clock, &repo).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_apply_unknown_proposal_is_not_found() {
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let (project_id, _) = seeded(&repo).await;

        let result = handle_apply_proposal(&apply(project_id, Uuid::new_v4()), &clock, &repo).await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_member_cannot_apply() {
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let (project_id, section_id) = seeded(&repo).await;
        let proposal_id = submit(&repo, project_id, section_id, "mine").await;
        let mut command = apply(project_id, proposal_id);
        command.actor = member();

        let result = handle_apply_proposal(&command, &clock, &repo).await;

        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
        let section = &list_ordered(project_id, &repo).await.unwrap()[0];
        assert_eq!(section.content, "Intro");
    }

    #[tokio::test]
    async fn test_reject_leaves_section_untouched() {
        // Arrange
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let (project_id, section_id) = seeded(&repo).await;
        let proposal_id = submit(&repo, project_id, section_id, "nope").await;

        // Act
        handle_set_proposal_status(
            &SetProposalStatus {
                correlation_id: Uuid::new_v4(),
                project_id,
                proposal_id,
                status: ProposalStatus::Rejected,
                actor: chair(),
            },
            &clock,
            &repo,
        )
        .await
        .unwrap();

        // Assert
        let proposal = get_proposal(project_id, proposal_id, &repo).await.unwrap();
        assert_eq!(proposal.status, ProposalStatus::Rejected);
        let section = &list_ordered(project_id, &repo).await.unwrap()[0];
        assert_eq!(section.content, "Intro");
    }

    #[tokio::test]
    async fn test_set_status_approved_is_refused() {
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let (project_id, section_id) = seeded(&repo).await;
        let proposal_id = submit(&repo, project_id, section_id, "text").await;

        let result = handle_set_proposal_status(
            &SetProposalStatus {
                correlation_id: Uuid::new_v4(),
                project_id,
                proposal_id,
                status: ProposalStatus::Approved,
                actor: chair(),
            },
            &clock,
            &repo,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_member_cannot_propose_after_cooking() {
        // Arrange
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let (project_id, section_id) = seeded(&repo).await;
        handle_transition_phase(
            &TransitionPhase {
                correlation_id: Uuid::new_v4(),
                project_id,
                target: Phase::ImageUpload,
                actor: chair(),
            },
            &clock,
            &repo,
        )
        .await
        .unwrap();

        // Act
        let result = handle_submit_proposal(
            &SubmitProposal {
                correlation_id: Uuid::new_v4(),
                project_id,
                proposal_id: Uuid::new_v4(),
                section_id,
                proposed_content: "late".to_owned(),
                actor: member(),
            },
            &clock,
            &repo,
        )
        .await;

        // Assert
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_proposal_for_unknown_section_is_not_found() {
        let clock = FixedClock::at_fixed_now();
        let repo = InMemoryEventRepository::new();
        let (project_id, _) = seeded(&repo).await;

        let result = handle_submit_proposal(
            &SubmitProposal {
                correlation_id: Uuid::new_v4(),
                project_id,
                proposal_id: Uuid::new_v4(),
                section_id: Uuid::new_v4(),
                proposed_content: "text".to_owned(),
                actor: member(),
            },
            &clock,
            &repo,
        )
        .await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
