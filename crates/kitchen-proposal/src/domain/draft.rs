//! Proposal drafts: compose, then submit or cancel.

use kitchen_core::access::Actor;
use kitchen_core::error::DomainError;
use uuid::Uuid;

use super::commands::SubmitProposal;

/// Composition state of one participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProposalDraft {
    /// Nothing is being composed.
    #[default]
    Idle,
    /// A proposal is being written for a section.
    Composing {
        /// Owning project.
        project_id: Uuid,
        /// Target section.
        section_id: Uuid,
        /// Text written so far, seeded with the section's current content.
        text: String,
    },
}

impl ProposalDraft {
    /// Starts composing against the section's current content.
    #[must_use]
    pub fn start(project_id: Uuid, section_id: Uuid, current_content: &str) -> Self {
        Self::Composing {
            project_id,
            section_id,
            text: current_content.to_owned(),
        }
    }

    /// Replaces the text being composed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when nothing is being composed.
    pub fn set_text(&mut self, new_text: impl Into<String>) -> Result<(), DomainError> {
        match self {
            Self::Idle => Err(DomainError::Validation(
                "no proposal is being composed".to_owned(),
            )),
            Self::Composing { text, .. } => {
                *text = new_text.into();
                Ok(())
            }
        }
    }

    /// Discards the draft.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Closes the draft and yields the command to send.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when nothing is being composed or
    /// the text is blank; a blank draft stays open.
    pub fn submit(
        &mut self,
        actor: Actor,
        correlation_id: Uuid,
    ) -> Result<SubmitProposal, DomainError> {
        match self {
            Self::Idle => Err(DomainError::Validation(
                "no proposal is being composed".to_owned(),
            )),
            Self::Composing { text, .. } if text.trim().is_empty() => Err(
                DomainError::Validation("proposal text must not be empty".to_owned()),
            ),
            Self::Composing {
                project_id,
                section_id,
                text,
            } => {
                let command = SubmitProposal {
                    correlation_id,
                    project_id: *project_id,
                    proposal_id: Uuid::new_v4(),
                    section_id: *section_id,
                    proposed_content: std::mem::take(text),
                    actor,
                };
                *self = Self::Idle;
                Ok(command)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitchen_core::access::Role;

    #[test]
    fn test_submit_yields_command_and_closes_draft() {
        let section_id = Uuid::new_v4();
        let mut draft = ProposalDraft::start(Uuid::new_v4(), section_id, "old");
        draft.set_text("new").unwrap();

        let command = draft
            .submit(Actor::new("alice", Role::Member), Uuid::new_v4())
            .unwrap();

        assert_eq!(command.section_id, section_id);
        assert_eq!(command.proposed_content, "new");
        assert_eq!(draft, ProposalDraft::Idle);
    }

    #[test]
    fn test_blank_draft_stays_open() {
        let mut draft = ProposalDraft::start(Uuid::new_v4(), Uuid::new_v4(), "old");
        draft.set_text("   ").unwrap();

        let result = draft.submit(Actor::new("alice", Role::Member), Uuid::new_v4());

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(matches!(draft, ProposalDraft::Composing { .. }));
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut draft = ProposalDraft::start(Uuid::new_v4(), Uuid::new_v4(), "old");

        draft.cancel();

        assert!(draft.set_text("x").is_err());
    }
}
