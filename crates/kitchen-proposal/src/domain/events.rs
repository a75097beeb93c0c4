//! Domain events for the Proposal context.

use std::fmt;

use kitchen_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review state of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Awaiting review.
    Pending,
    /// Adopted into the section.
    Approved,
    /// Declined.
    Rejected,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        })
    }
}

/// Emitted when a proposal is submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalSubmitted {
    /// The project identifier.
    pub project_id: Uuid,
    /// The proposal identifier.
    pub proposal_id: Uuid,
    /// The section the text is proposed for.
    pub section_id: Uuid,
    /// Author, or `anonymous`.
    pub proposed_by: String,
    /// The proposed text.
    pub proposed_content: String,
}

/// Emitted when a pending proposal is approved or rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalReviewed {
    /// The project identifier.
    pub project_id: Uuid,
    /// The proposal identifier.
    pub proposal_id: Uuid,
    /// The terminal status.
    pub status: ProposalStatus,
}

/// Event type identifier for [`ProposalSubmitted`].
pub const PROPOSAL_SUBMITTED_EVENT_TYPE: &str = "proposal.submitted";

/// Event type identifier for [`ProposalReviewed`].
pub const PROPOSAL_REVIEWED_EVENT_TYPE: &str = "proposal.reviewed";

/// Event payload variants for the Proposal context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProposalEventKind {
    /// A proposal was submitted.
    ProposalSubmitted(ProposalSubmitted),
    /// A proposal left `pending`.
    ProposalReviewed(ProposalReviewed),
}

impl ProposalEventKind {
    pub(crate) fn event_type(&self) -> &'static str {
        match self {
            Self::ProposalSubmitted(_) => PROPOSAL_SUBMITTED_EVENT_TYPE,
            Self::ProposalReviewed(_) => PROPOSAL_REVIEWED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Proposal context.
#[derive(Debug, Clone)]
pub struct ProposalEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ProposalEventKind,
}

impl DomainEvent for ProposalEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("ProposalEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
