//! The phase controller.
//!
//! A project moves `cooking → image_upload → image_selection → download`,
//! one step at a time. `archived` can be entered from anywhere and left only
//! back to `cooking`. Each phase opens a subset of operations to regular
//! contributors; privileged roles are never phase-gated.

use std::fmt;
use std::str::FromStr;

use kitchen_core::access::{Actor, Operation};
use kitchen_core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Writing and restructuring the script.
    Cooking,
    /// Contributors submit candidate images.
    ImageUpload,
    /// Images are adopted per section.
    ImageSelection,
    /// The deliverable is downloaded.
    Download,
    /// Parked; reversible back to cooking.
    Archived,
}

impl Phase {
    /// The linear forward order. `Archived` is an exit, not a step.
    pub const FORWARD: [Self; 4] = [
        Self::Cooking,
        Self::ImageUpload,
        Self::ImageSelection,
        Self::Download,
    ];

    /// The phase one forward step after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Cooking => Some(Self::ImageUpload),
            Self::ImageUpload => Some(Self::ImageSelection),
            Self::ImageSelection => Some(Self::Download),
            Self::Download | Self::Archived => None,
        }
    }

    /// Wire name of the phase.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cooking => "cooking",
            Self::ImageUpload => "image_upload",
            Self::ImageSelection => "image_selection",
            Self::Download => "download",
            Self::Archived => "archived",
        }
    }

    /// The tab participants work in during this phase.
    #[must_use]
    pub fn tab(self) -> Tab {
        match self {
            Self::Cooking => Tab::Script,
            Self::ImageUpload => Tab::ImageUpload,
            Self::ImageSelection => Tab::ImageSelection,
            Self::Download | Self::Archived => Tab::Download,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cooking" => Ok(Self::Cooking),
            "image_upload" => Ok(Self::ImageUpload),
            "image_selection" => Ok(Self::ImageSelection),
            "download" => Ok(Self::Download),
            "archived" => Ok(Self::Archived),
            other => Err(DomainError::Validation(format!("unknown phase: {other}"))),
        }
    }
}

/// How a requested transition relates to the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current phase; nothing to record.
    Unchanged,
    /// One step along the forward order.
    Forward,
    /// Exit into `archived`.
    Archive,
    /// `archived` back to `cooking`.
    Restore,
}

/// Classifies a transition request.
///
/// # Errors
///
/// Returns `DomainError::Validation` for skips, backward steps, or leaving
/// `archived` for anything other than `cooking`.
pub fn classify_transition(from: Phase, to: Phase) -> Result<Transition, DomainError> {
    if from == to {
        return Ok(Transition::Unchanged);
    }
    match (from, to) {
        (_, Phase::Archived) => Ok(Transition::Archive),
        (Phase::Archived, Phase::Cooking) => Ok(Transition::Restore),
        _ if from.next() == Some(to) => Ok(Transition::Forward),
        _ => Err(DomainError::Validation(format!(
            "cannot move project from {from} to {to}"
        ))),
    }
}

/// Whether a phase opens `operation` to non-privileged participants.
#[must_use]
pub fn phase_permits(phase: Phase, operation: Operation) -> bool {
    use Operation as Op;

    match operation {
        Op::ViewProject | Op::CreateProject | Op::Heartbeat => true,
        Op::SubmitProposal => phase == Phase::Cooking,
        Op::SubmitImage | Op::ManageOwnImage => {
            matches!(phase, Phase::ImageUpload | Phase::ImageSelection)
        }
        Op::SelectImage => phase == Phase::ImageSelection,
        Op::Export => matches!(phase, Phase::Download | Phase::Archived),
        Op::DeleteProject
        | Op::TransitionPhase
        | Op::ImportScript
        | Op::InsertSection
        | Op::DeleteSection
        | Op::ReorderSections
        | Op::EditSection
        | Op::ReviewProposal
        | Op::ManageAnyImage => false,
    }
}

/// Combined role and phase gate applied by every entry point.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` when the role lacks the capability or
/// the phase keeps the operation closed for this role.
pub fn authorize(actor: &Actor, phase: Phase, operation: Operation) -> Result<(), DomainError> {
    actor.authorize(operation)?;
    if actor.role.is_privileged() || phase_permits(phase, operation) {
        Ok(())
    } else {
        Err(DomainError::Unauthorized(format!(
            "{operation:?} is closed during the {phase} phase"
        )))
    }
}

/// UI surfaces of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    /// Section editing and proposals.
    Script,
    /// Image submission per section.
    ImageUpload,
    /// Image adoption per section.
    ImageSelection,
    /// Script and bundle downloads.
    Download,
}

impl Tab {
    /// All tabs in display order.
    pub const ALL: [Self; 4] = [
        Self::Script,
        Self::ImageUpload,
        Self::ImageSelection,
        Self::Download,
    ];
}

/// Which tabs a participant may open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// The tab matching the current phase.
    pub current_tab: Tab,
    /// Tabs the participant may open.
    pub open_tabs: Vec<Tab>,
    /// True when the participant is pinned to `current_tab`.
    pub forced: bool,
}

/// Privileged roles roam freely; everyone else is force-navigated to the
/// tab of the current phase.
#[must_use]
pub fn navigation(actor: &Actor, phase: Phase) -> Navigation {
    let current_tab = phase.tab();
    if actor.role.is_privileged() {
        Navigation {
            current_tab,
            open_tabs: Tab::ALL.to_vec(),
            forced: false,
        }
    } else {
        Navigation {
            current_tab,
            open_tabs: vec![current_tab],
            forced: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitchen_core::access::Role;

    #[test]
    fn test_forward_transitions_are_single_steps() {
        assert_eq!(
            classify_transition(Phase::Cooking, Phase::ImageUpload).unwrap(),
            Transition::Forward
        );
        assert_eq!(
            classify_transition(Phase::ImageSelection, Phase::Download).unwrap(),
            Transition::Forward
        );
        assert!(classify_transition(Phase::Cooking, Phase::ImageSelection).is_err());
        assert!(classify_transition(Phase::Download, Phase::Cooking).is_err());
        assert!(classify_transition(Phase::ImageUpload, Phase::Cooking).is_err());
    }

    #[test]
    fn test_archive_is_reachable_from_every_phase() {
        for phase in Phase::FORWARD {
            assert_eq!(
                classify_transition(phase, Phase::Archived).unwrap(),
                Transition::Archive
            );
        }
    }

    #[test]
    fn test_archived_only_restores_to_cooking() {
        assert_eq!(
            classify_transition(Phase::Archived, Phase::Cooking).unwrap(),
            Transition::Restore
        );
        assert!(classify_transition(Phase::Archived, Phase::Download).is_err());
    }

    #[test]
    fn test_same_target_is_unchanged() {
        assert_eq!(
            classify_transition(Phase::Archived, Phase::Archived).unwrap(),
            Transition::Unchanged
        );
    }

    #[test]
    fn test_member_phase_gates() {
        let member = Actor::new("alice", Role::Member);

        assert!(authorize(&member, Phase::Cooking, Operation::SubmitProposal).is_ok());
        assert!(authorize(&member, Phase::ImageUpload, Operation::SubmitProposal).is_err());
        assert!(authorize(&member, Phase::ImageUpload, Operation::SubmitImage).is_ok());
        assert!(authorize(&member, Phase::Cooking, Operation::SubmitImage).is_err());
        assert!(authorize(&member, Phase::Download, Operation::SubmitImage).is_err());
        assert!(authorize(&member, Phase::ImageUpload, Operation::SelectImage).is_err());
        assert!(authorize(&member, Phase::ImageSelection, Operation::SelectImage).is_ok());
        assert!(authorize(&member, Phase::Cooking, Operation::Export).is_err());
        assert!(authorize(&member, Phase::Archived, Operation::Export).is_ok());
    }

    #[test]
    fn test_privileged_roles_bypass_phase_gates() {
        let chair = Actor::new("carol", Role::Owner);
        for phase in [Phase::Download, Phase::Archived, Phase::Cooking] {
            assert!(authorize(&chair, phase, Operation::InsertSection).is_ok());
            assert!(authorize(&chair, phase, Operation::SelectImage).is_ok());
        }
    }

    #[test]
    fn test_member_cannot_edit_sections_even_while_cooking() {
        let member = Actor::new("alice", Role::Member);
        assert!(authorize(&member, Phase::Cooking, Operation::EditSection).is_err());
    }

    #[test]
    fn test_non_privileged_are_forced_to_phase_tab() {
        let guest = Actor::new("dave", Role::Guest);
        let nav = navigation(&guest, Phase::ImageSelection);
        assert!(nav.forced);
        assert_eq!(nav.open_tabs, vec![Tab::ImageSelection]);

        let nav = navigation(&guest, Phase::Archived);
        assert_eq!(nav.current_tab, Tab::Download);
    }

    #[test]
    fn test_privileged_may_open_every_tab() {
        let honorary = Actor::new("erin", Role::Honorary);
        let nav = navigation(&honorary, Phase::Cooking);
        assert!(!nav.forced);
        assert_eq!(nav.open_tabs.len(), 4);
        assert_eq!(nav.current_tab, Tab::Script);
    }

    #[test]
    fn test_phase_parses_wire_names() {
        assert_eq!("image_upload".parse::<Phase>().unwrap(), Phase::ImageUpload);
        assert!("done".parse::<Phase>().is_err());
    }
}
