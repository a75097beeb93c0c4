//! Query handlers for the Proposal context.

use chrono::{DateTime, Utc};
use kitchen_core::error::DomainError;
use kitchen_core::repository::EventRepository;
use kitchen_script::application::query_handlers::{get_section, list_ordered};
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::load_board;
use crate::domain::aggregates::Proposal;
use crate::domain::events::ProposalStatus;

/// Read-only view of a proposal.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    /// The proposal identifier.
    pub proposal_id: Uuid,
    /// The section it targets.
    pub section_id: Uuid,
    /// Author, or `anonymous`.
    pub proposed_by: String,
    /// The proposed text.
    pub proposed_content: String,
    /// Review state.
    pub status: ProposalStatus,
    /// When it was submitted.
    pub created_at: DateTime<Utc>,
    /// When it last changed.
    pub updated_at: DateTime<Utc>,
}

impl From<&Proposal> for ProposalView {
    fn from(proposal: &Proposal) -> Self {
        Self {
            proposal_id: proposal.id,
            section_id: proposal.section_id,
            proposed_by: proposal.proposed_by.clone(),
            proposed_content: proposal.proposed_content.clone(),
            status: proposal.status,
            created_at: proposal.created_at,
            updated_at: proposal.updated_at,
        }
    }
}

fn newest_first<'a>(
    proposals: impl Iterator<Item = &'a Proposal>,
) -> impl Iterator<Item = ProposalView> {
    let mut views: Vec<ProposalView> = proposals.map(ProposalView::from).collect();
    // Submission order is stable, so reversing keeps same-instant ties newest first.
    views.reverse();
    views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    views.into_iter()
}

/// Lists the proposals of one section, newest first.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project and
/// `DomainError::NotFound` for a missing section.
pub async fn list_for_section(
    project_id: Uuid,
    section_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Vec<ProposalView>, DomainError> {
    get_section(project_id, section_id, repo).await?;
    let board = load_board(project_id, repo).await?;
    Ok(newest_first(board.proposals.iter().filter(|p| p.section_id == section_id)).collect())
}

/// Lists the proposals of a project: sections in order, each section's
/// proposals newest first. Proposals of deleted sections are omitted.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for a missing project.
pub async fn list_for_project(
    project_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Vec<ProposalView>, DomainError> {
    let sections = list_ordered(project_id, repo).await?;
    let board = load_board(project_id, repo).await?;
    Ok(sections
        .iter()
        .flat_map(|section| {
            newest_first(
                board
                    .proposals
                    .iter()
                    .filter(|p| p.section_id == section.section_id),
            )
        })
        .collect())
}

/// Retrieves one proposal.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown proposal.
pub async fn get_proposal(
    project_id: Uuid,
    proposal_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<ProposalView, DomainError> {
    let board = load_board(project_id, repo).await?;
    board
        .proposal(proposal_id)
        .map(ProposalView::from)
        .ok_or_else(|| DomainError::not_found("proposal", proposal_id))
}
