//! Roles, operations and the capability table.
//!
//! Role checks happen in the service layer on every call; storage never
//! enforces them. Phase gating lives with the project context and is
//! layered on top of [`can_perform`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Attribution used when a write happens without a session.
pub const ANONYMOUS: &str = "anonymous";

/// Participant role within the kitchen.
///
/// Serialized as the legacy role strings (`gicho`, `meiyo_giin`, `giin`,
/// `guest`) so existing role data keeps working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Project chair (`gicho`).
    #[serde(rename = "gicho")]
    Owner,
    /// Honorary member (`meiyo_giin`).
    #[serde(rename = "meiyo_giin")]
    Honorary,
    /// Regular contributor (`giin`).
    #[serde(rename = "giin")]
    Member,
    /// Observer without contribution rights.
    #[serde(rename = "guest")]
    Guest,
}

impl Role {
    /// Owner and honorary members may restructure the script, review
    /// proposals and move the project through its phases.
    #[must_use]
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Owner | Self::Honorary)
    }

    /// The legacy role string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "gicho",
            Self::Honorary => "meiyo_giin",
            Self::Member => "giin",
            Self::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gicho" => Ok(Self::Owner),
            "meiyo_giin" => Ok(Self::Honorary),
            "giin" => Ok(Self::Member),
            "guest" => Ok(Self::Guest),
            other => Err(DomainError::Validation(format!("unknown role: {other}"))),
        }
    }
}

/// Every operation the service layer authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read project, sections, images and proposals.
    ViewProject,
    /// Create a new project.
    CreateProject,
    /// Delete a project.
    DeleteProject,
    /// Move the project to another phase.
    TransitionPhase,
    /// Replace all sections from a raw script.
    ImportScript,
    /// Insert a section at an index.
    InsertSection,
    /// Delete a section and close the gap.
    DeleteSection,
    /// Reorder the full section sequence.
    ReorderSections,
    /// Edit a section's content or image settings.
    EditSection,
    /// Propose alternative text for a section.
    SubmitProposal,
    /// Approve or reject a proposal.
    ReviewProposal,
    /// Request an upload slot and register an uploaded image.
    SubmitImage,
    /// Toggle an image's adoption flag.
    SelectImage,
    /// Comment on or delete one's own image.
    ManageOwnImage,
    /// Comment on or delete any image.
    ManageAnyImage,
    /// Report liveness.
    Heartbeat,
    /// Download the script or the image bundle.
    Export,
}

/// The single role capability table.
#[must_use]
pub fn can_perform(role: Role, operation: Operation) -> bool {
    use Operation as Op;

    match role {
        Role::Owner | Role::Honorary => true,
        Role::Member => matches!(
            operation,
            Op::ViewProject
                | Op::CreateProject
                | Op::SubmitProposal
                | Op::SubmitImage
                | Op::SelectImage
                | Op::ManageOwnImage
                | Op::Heartbeat
                | Op::Export
        ),
        Role::Guest => matches!(
            operation,
            Op::ViewProject | Op::CreateProject | Op::Heartbeat | Op::Export
        ),
    }
}

/// The caller of an operation: who they are and what role they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User identifier, or [`ANONYMOUS`].
    pub user_id: String,
    /// Role resolved for this user.
    pub role: Role,
}

impl Actor {
    /// Creates an actor for an authenticated user.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// The actor used when no session is present.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS, Role::Guest)
    }

    /// Whether the actor carries a real session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id != ANONYMOUS
    }

    /// Checks the capability table for this actor.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthorized` if the role lacks the capability.
    pub fn authorize(&self, operation: Operation) -> Result<(), DomainError> {
        if can_perform(self.role, operation) {
            Ok(())
        } else {
            Err(DomainError::Unauthorized(format!(
                "role {} may not perform {operation:?}",
                self.role
            )))
        }
    }

    /// Requires a real session, for operations that cannot be attributed
    /// to `anonymous`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthorized` for the anonymous actor.
    pub fn require_session(&self) -> Result<(), DomainError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(DomainError::Unauthorized("a session is required".to_owned()))
        }
    }

    /// Uploader-or-privileged rule shared by image comment and delete.
    #[must_use]
    pub fn may_manage_image(&self, uploaded_by: &str) -> bool {
        if can_perform(self.role, Operation::ManageAnyImage) {
            return true;
        }
        self.is_authenticated()
            && self.user_id == uploaded_by
            && can_perform(self.role, Operation::ManageOwnImage)
    }
}
