//! Commands for the Proposal context.

use kitchen_core::access::Actor;
use kitchen_core::command::Command;
use uuid::Uuid;

use super::events::ProposalStatus;

/// Command to propose alternative text for a section.
#[derive(Debug, Clone)]
pub struct SubmitProposal {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// Identifier chosen for the new proposal.
    pub proposal_id: Uuid,
    /// Target section.
    pub section_id: Uuid,
    /// The proposed text.
    pub proposed_content: String,
    /// The author.
    pub actor: Actor,
}

impl Command for SubmitProposal {
    fn command_type(&self) -> &'static str {
        "proposal.submit"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to write a proposal's status directly. Only `rejected` is
/// accepted; approval goes through [`ApplyProposal`].
#[derive(Debug, Clone)]
pub struct SetProposalStatus {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// The proposal identifier.
    pub proposal_id: Uuid,
    /// Requested status.
    pub status: ProposalStatus,
    /// The reviewer.
    pub actor: Actor,
}

impl Command for SetProposalStatus {
    fn command_type(&self) -> &'static str {
        "proposal.set_status"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}

/// Command to adopt a pending proposal into its section.
#[derive(Debug, Clone)]
pub struct ApplyProposal {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project identifier.
    pub project_id: Uuid,
    /// The proposal identifier.
    pub proposal_id: Uuid,
    /// The reviewer.
    pub actor: Actor,
}

impl Command for ApplyProposal {
    fn command_type(&self) -> &'static str {
        "proposal.apply"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn project_id(&self) -> Uuid {
        self.project_id
    }
}
