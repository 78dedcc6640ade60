use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal for a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains(Permission::WILDCARD) || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Role → permission mapping.
///
/// The default policy mirrors the dashboard's two views: partners browse the
/// catalog and place orders; admins may do everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    grants: HashMap<Role, Vec<Permission>>,
}

impl RolePolicy {
    pub fn empty() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    pub fn grant(mut self, role: Role, permissions: Vec<Permission>) -> Self {
        self.grants.entry(role).or_default().extend(permissions);
        self
    }

    /// Union of the permissions granted to `roles`, without duplicates.
    pub fn permissions_for(&self, roles: &[Role]) -> Vec<Permission> {
        let mut seen = HashSet::new();
        roles
            .iter()
            .filter_map(|role| self.grants.get(role))
            .flatten()
            .filter(|p| seen.insert((*p).clone()))
            .cloned()
            .collect()
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::empty()
            .grant(
                Role::partner(),
                vec![Permission::catalog_read(), Permission::orders_place()],
            )
            .grant(Role::admin(), vec![Permission::wildcard()])
    }
}
