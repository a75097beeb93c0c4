//! Identity at the HTTP edge.
//!
//! Sessions are issued by the upstream gateway, which forwards the signed-in
//! user as `x-user-id` / `x-user-name`. Roles come from a YAML file mapping
//! user ids to the legacy role strings.

use std::collections::HashMap;
use std::path::Path;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use kitchen_core::access::{Actor, Role};
use kitchen_core::identity::{RoleDirectory, Session};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the signed-in user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the signed-in user's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Reads the session from gateway headers. A missing or blank user id means
/// no session; a missing name falls back to the id.
#[must_use]
pub fn session_from_headers(headers: &HeaderMap) -> Option<Session> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let user_id = header(USER_ID_HEADER)?;
    Some(Session {
        user_id: user_id.to_owned(),
        display_name: header(USER_NAME_HEADER).unwrap_or(user_id).to_owned(),
    })
}

/// The caller of a request: their session, if any, and the resolved actor.
#[derive(Debug, Clone)]
pub struct Caller {
    /// The gateway session.
    pub session: Option<Session>,
    /// Who the kitchen treats the caller as.
    pub actor: Actor,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = session_from_headers(&parts.headers);
        let actor = state.role_directory.actor_for(session.as_ref());
        Ok(Self { session, actor })
    }
}

/// Role assignments loaded from YAML (`user_id: gicho`).
#[derive(Debug, Clone, Default)]
pub struct YamlRoleDirectory {
    roles: HashMap<String, Role>,
}

impl YamlRoleDirectory {
    /// A directory with no assignments: everyone signed in is a member.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a YAML mapping of user ids to role strings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for malformed YAML or unknown roles.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AppError> {
        let roles: Option<HashMap<String, Role>> = serde_yaml::from_str(yaml)
            .map_err(|e| AppError::Config(format!("invalid roles file: {e}")))?;
        Ok(Self {
            roles: roles.unwrap_or_default(),
        })
    }

    /// Loads the role file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the file is unreadable or invalid.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read roles file {}: {e}", path.display()))
        })?;
        let directory = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), assignments = directory.roles.len(), "roles loaded");
        Ok(directory)
    }
}

impl RoleDirectory for YamlRoleDirectory {
    fn role_of(&self, user_id: &str) -> Option<Role> {
        self.roles.get(user_id).copied()
    }
}
