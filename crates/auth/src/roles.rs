use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque strings; [`crate::RolePolicy`] maps them to permissions.
/// The two roles the dashboard ships with are `partner` and `admin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const PARTNER: &'static str = "partner";
    pub const ADMIN: &'static str = "admin";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn partner() -> Self {
        Self::new(Self::PARTNER)
    }

    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
