use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Permission, Role, RolePolicy};

/// Identity of an authenticated caller (partner shop, admin, service account).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A fully resolved caller, passed explicitly into every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub display_name: String,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    /// Resolve a principal's permissions from its roles.
    pub fn with_roles(
        principal_id: PrincipalId,
        display_name: impl Into<String>,
        roles: Vec<Role>,
        policy: &RolePolicy,
    ) -> Self {
        let permissions = policy.permissions_for(&roles);
        Self {
            principal_id,
            display_name: display_name.into(),
            roles,
            permissions,
        }
    }

    /// A partner caller under the default role policy.
    pub fn partner(display_name: impl Into<String>) -> Self {
        Self::with_roles(
            PrincipalId::new(),
            display_name,
            vec![Role::partner()],
            &RolePolicy::default(),
        )
    }

    /// An admin caller under the default role policy.
    pub fn admin(display_name: impl Into<String>) -> Self {
        Self::with_roles(
            PrincipalId::new(),
            display_name,
            vec![Role::admin()],
            &RolePolicy::default(),
        )
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}
