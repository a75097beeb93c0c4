//! Static identity collaborators.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use kitchen_core::access::Role;
use kitchen_core::error::DomainError;
use kitchen_core::identity::{DisplayNameResolver, RoleDirectory};

/// Display names from a fixed table.
#[derive(Debug, Default, Clone)]
pub struct StaticDisplayNames(HashMap<String, String>);

impl StaticDisplayNames {
    /// Builds the table from `(user_id, display_name)` pairs.
    #[must_use]
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(id, name)| (id.to_owned(), name.to_owned()))
                .collect(),
        )
    }
}

#[async_trait]
impl DisplayNameResolver for StaticDisplayNames {
    async fn resolve_display_names(
        &self,
        user_ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>, DomainError> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.0.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }
}

/// Roles from a fixed table.
#[derive(Debug, Default, Clone)]
pub struct StaticRoleDirectory(HashMap<String, Role>);

impl StaticRoleDirectory {
    /// Builds the table from `(user_id, role)` pairs.
    #[must_use]
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, Role)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(id, role)| (id.to_owned(), role))
                .collect(),
        )
    }
}

impl RoleDirectory for StaticRoleDirectory {
    fn role_of(&self, user_id: &str) -> Option<Role> {
        self.0.get(user_id).copied()
    }
}
