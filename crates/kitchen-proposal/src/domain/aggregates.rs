//! Aggregate roots for the Proposal context.

use chrono::{DateTime, Utc};
use kitchen_core::aggregate::AggregateRoot;
use kitchen_core::clock::Clock;
use kitchen_core::error::DomainError;
use kitchen_core::event::EventMetadata;
use kitchen_core::stream::ProjectStream;
use uuid::Uuid;

use super::events::{
    ProposalEvent, ProposalEventKind, ProposalReviewed, ProposalStatus, ProposalSubmitted,
};

/// A proposed replacement text for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// Proposal identifier.
    pub id: Uuid,
    /// Target section.
    pub section_id: Uuid,
    /// Author, or `anonymous`.
    pub proposed_by: String,
    /// The proposed text.
    pub proposed_content: String,
    /// Review state.
    pub status: ProposalStatus,
    /// When the proposal was submitted.
    pub created_at: DateTime<Utc>,
    /// When the proposal last changed.
    pub updated_at: DateTime<Utc>,
}

/// Every proposal of one project, in submission order.
#[derive(Debug)]
pub struct ProposalBoard {
    /// Stream identifier, derived from the project id.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Proposals in submission order.
    pub proposals: Vec<Proposal>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<ProposalEvent>,
}

impl ProposalBoard {
    /// Creates an empty board for `project_id`.
    #[must_use]
    pub fn new(project_id: Uuid) -> Self {
        Self {
            id: ProjectStream::ProposalBoard.id_for(project_id),
            project_id,
            version: 0,
            proposals: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Looks a proposal up by id.
    #[must_use]
    pub fn proposal(&self, proposal_id: Uuid) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id == proposal_id)
    }

    /// The proposal, provided it is still awaiting review.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown proposal and
    /// `DomainError::Validation` once it has left `pending`.
    pub fn pending(&self, proposal_id: Uuid) -> Result<&Proposal, DomainError> {
        let proposal = self
            .proposal(proposal_id)
            .ok_or_else(|| DomainError::not_found("proposal", proposal_id))?;
        if proposal.status == ProposalStatus::Pending {
            Ok(proposal)
        } else {
            Err(DomainError::Validation(format!(
                "proposal {proposal_id} is not pending (status: {})",
                proposal.status
            )))
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(
        &mut self,
        kind: ProposalEventKind,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) {
        let event = ProposalEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                recorded_by: recorded_by.to_owned(),
                occurred_at: clock.now(),
            },
            kind,
        };
        self.uncommitted_events.push(event);
    }

    /// Records a new pending proposal. A section may hold any number of
    /// pending proposals.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for blank text or a reused id.
    pub fn submit(
        &mut self,
        proposal_id: Uuid,
        section_id: Uuid,
        proposed_content: &str,
        correlation_id: Uuid,
        proposed_by: &str,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if proposed_content.trim().is_empty() {
            return Err(DomainError::Validation(
                "proposal text must not be empty".to_owned(),
            ));
        }
        if self.proposal(proposal_id).is_some() {
            return Err(DomainError::Validation(format!(
                "proposal {proposal_id} already exists"
            )));
        }
        self.record(
            ProposalEventKind::ProposalSubmitted(ProposalSubmitted {
                project_id: self.project_id,
                proposal_id,
                section_id,
                proposed_by: proposed_by.to_owned(),
                proposed_content: proposed_content.to_owned(),
            }),
            correlation_id,
            proposed_by,
            clock,
        );
        Ok(())
    }

    fn review(
        &mut self,
        proposal_id: Uuid,
        status: ProposalStatus,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.pending(proposal_id)?;
        self.record(
            ProposalEventKind::ProposalReviewed(ProposalReviewed {
                project_id: self.project_id,
                proposal_id,
                status,
            }),
            correlation_id,
            recorded_by,
            clock,
        );
        Ok(())
    }

    /// Marks a pending proposal approved.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` or `DomainError::Validation` as for
    /// [`Self::pending`].
    pub fn approve(
        &mut self,
        proposal_id: Uuid,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.review(
            proposal_id,
            ProposalStatus::Approved,
            correlation_id,
            recorded_by,
            clock,
        )
    }

    /// Marks a pending proposal rejected.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` or `DomainError::Validation` as for
    /// [`Self::pending`].
    pub fn reject(
        &mut self,
        proposal_id: Uuid,
        correlation_id: Uuid,
        recorded_by: &str,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.review(
            proposal_id,
            ProposalStatus::Rejected,
            correlation_id,
            recorded_by,
            clock,
        )
    }
}

impl AggregateRoot for ProposalBoard {
    type Event = ProposalEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        let at = event.metadata.occurred_at;
        match &event.kind {
            ProposalEventKind::ProposalSubmitted(payload) => {
                self.proposals.push(Proposal {
                    id: payload.proposal_id,
                    section_id: payload.section_id,
                    proposed_by: payload.proposed_by.clone(),
                    proposed_content: payload.proposed_content.clone(),
                    status: ProposalStatus::Pending,
                    created_at: at,
                    updated_at: at,
                });
            }
            ProposalEventKind::ProposalReviewed(payload) => {
                if let Some(proposal) = self
                    .proposals
                    .iter_mut()
                    .find(|p| p.id == payload.proposal_id)
                {
                    proposal.status = payload.status;
                    proposal.updated_at = at;
                }
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitchen_test_support::FixedClock;

    fn commit(board: &mut ProposalBoard) {
        for event in board.uncommitted_events().to_vec() {
            board.apply(&event);
        }
        board.clear_uncommitted_events();
    }

    fn board_with_pending(clock: &FixedClock) -> (ProposalBoard, Uuid) {
        let mut board = ProposalBoard::new(Uuid::new_v4());
        let proposal_id = Uuid::new_v4();
        board
            .submit(proposal_id, Uuid::new_v4(), "better text", Uuid::new_v4(), "alice", clock)
            .unwrap();
        commit(&mut board);
        (board, proposal_id)
    }

    #[test]
    fn test_submit_records_pending_proposal() {
        let clock = FixedClock::at_fixed_now();

        let (board, proposal_id) = board_with_pending(&clock);

        let proposal = board.proposal(proposal_id).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Pending);
        assert_eq!(proposal.proposed_by, "alice");
        assert_eq!(proposal.created_at, clock.0);
    }

    #[test]
    fn test_submit_rejects_blank_text() {
        let clock = FixedClock::at_fixed_now();
        let mut board = ProposalBoard::new(Uuid::new_v4());

        let result = board.submit(Uuid::new_v4(), Uuid::new_v4(), "  \n", Uuid::new_v4(), "alice", &clock);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_many_pending_proposals_per_section() {
        let clock = FixedClock::at_fixed_now();
        let mut board = ProposalBoard::new(Uuid::new_v4());
        let section_id = Uuid::new_v4();

        for text in ["one", "two", "three"] {
            board
                .submit(Uuid::new_v4(), section_id, text, Uuid::new_v4(), "alice", &clock)
                .unwrap();
        }
        commit(&mut board);

        assert_eq!(board.proposals.len(), 3);
        assert!(board
            .proposals
            .iter()
            .all(|p| p.status == ProposalStatus::Pending));
    }

    #[test]
    fn test_reviewed_proposal_is_immutable() {
        // Arrange
        let clock = FixedClock::at_fixed_now();
        let (mut board, proposal_id) = board_with_pending(&clock);
        board
            .reject(proposal_id, Uuid::new_v4(), "carol", &clock)
            .unwrap();
        commit(&mut board);

        // Act
        let approve = board.approve(proposal_id, Uuid::new_v4(), "carol", &clock);
        let reject = board.reject(proposal_id, Uuid::new_v4(), "carol", &clock);

        // Assert
        assert!(matches!(approve, Err(DomainError::Validation(_))));
        assert!(matches!(reject, Err(DomainError::Validation(_))));
        assert_eq!(
            board.proposal(proposal_id).unwrap().status,
            ProposalStatus::Rejected
        );
    }

    #[test]
    fn test_review_of_unknown_proposal_is_not_found() {
        let clock = FixedClock::at_fixed_now();
        let mut board = ProposalBoard::new(Uuid::new_v4());

        let result = board.approve(Uuid::new_v4(), Uuid::new_v4(), "carol", &clock);

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
