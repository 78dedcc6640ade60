//! Strongly-typed identifiers used across the domain.

use core::hash::{Hash, Hasher};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of an order record.
///
/// Generated from UUIDv7: time-ordered, with 74 random bits per id so that two
/// orders submitted within the same millisecond still get distinct ids.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Create a new identifier.
    ///
    /// Prefer passing IDs explicitly in tests for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for OrderId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<OrderId> for Uuid {
    fn from(value: OrderId) -> Self {
        value.0
    }
}

impl FromStr for OrderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s.trim())
            .map_err(|e| DomainError::invalid_id(format!("OrderId: {e}")))?;
        Ok(Self(uuid))
    }
}

const MAX_CODE_LEN: usize = 64;

/// Product code as printed on the tag (e.g. `EG-R001`).
///
/// The code keeps the spelling it was entered with, but equality and hashing
/// are case-insensitive: `eg-r001` and `EG-R001` are the same product. There
/// is no prefix or substring matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductCode(String);

impl ProductCode {
    /// Parse and validate a code. Surrounding whitespace is trimmed.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(DomainError::invalid_id("product code cannot be empty"));
        }
        if code.len() > MAX_CODE_LEN {
            return Err(DomainError::invalid_id(format!(
                "product code longer than {MAX_CODE_LEN} characters"
            )));
        }
        if code.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DomainError::invalid_id(format!(
                "product code '{code}' contains whitespace"
            )));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical (upper-case) form used for comparisons.
    pub fn normalized(&self) -> String {
        self.0.to_uppercase()
    }
}

impl PartialEq for ProductCode {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for ProductCode {}

impl Hash for ProductCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl core::fmt::Display for ProductCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProductCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProductCode> for String {
    fn from(value: ProductCode) -> Self {
        value.0
    }
}
