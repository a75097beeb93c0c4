//! Identity collaborators.
//!
//! Session issuance and user profiles live outside the kitchen. The core
//! only consumes them through these seams.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use crate::access::{Actor, Role};
use crate::error::DomainError;

/// The authenticated caller as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Stable user identifier.
    pub user_id: String,
    /// Name shown next to the user's contributions.
    pub display_name: String,
}

/// Resolves the role a user holds.
pub trait RoleDirectory: Send + Sync {
    /// Returns the configured role, or `None` if the user has no explicit
    /// assignment.
    fn role_of(&self, user_id: &str) -> Option<Role>;

    /// Builds the actor for an optional session. Authenticated users
    /// without an explicit role are members; no session means anonymous.
    fn actor_for(&self, session: Option<&Session>) -> Actor {
        match session {
            Some(session) => Actor::new(
                session.user_id.clone(),
                self.role_of(&session.user_id).unwrap_or(Role::Member),
            ),
            None => Actor::anonymous(),
        }
    }
}

/// Maps user ids to display names. Used only for labels, never for
/// authorization.
#[async_trait]
pub trait DisplayNameResolver: Send + Sync {
    /// Resolves as many of `user_ids` as are known. Unknown ids are simply
    /// absent from the result.
    async fn resolve_display_names(
        &self,
        user_ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>, DomainError>;
}
