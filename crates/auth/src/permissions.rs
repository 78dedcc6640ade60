use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "catalog.read").
/// The wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const CATALOG_READ: &'static str = "catalog.read";
    pub const CATALOG_WRITE: &'static str = "catalog.write";
    pub const ORDERS_PLACE: &'static str = "orders.place";
    pub const ORDERS_READ: &'static str = "orders.read";
    pub const ORDERS_DISPATCH: &'static str = "orders.dispatch";
    pub const WILDCARD: &'static str = "*";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn catalog_read() -> Self {
        Self::new(Self::CATALOG_READ)
    }

    pub fn catalog_write() -> Self {
        Self::new(Self::CATALOG_WRITE)
    }

    pub fn orders_place() -> Self {
        Self::new(Self::ORDERS_PLACE)
    }

    pub fn orders_read() -> Self {
        Self::new(Self::ORDERS_READ)
    }

    pub fn orders_dispatch() -> Self {
        Self::new(Self::ORDERS_DISPATCH)
    }

    pub fn wildcard() -> Self {
        Self::new(Self::WILDCARD)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == Self::WILDCARD
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
