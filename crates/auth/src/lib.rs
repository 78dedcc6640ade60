//! `everglow-auth`: explicit caller context and authorization checks.
//!
//! Every catalog and order operation receives the caller's [`Principal`]
//! instead of reading a process-wide "who is logged in" flag. This crate is
//! decoupled from transport and storage.

pub mod authorize;
pub mod credentials;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, RolePolicy, authorize};
pub use credentials::{CredentialError, CredentialVerifier, StaticCredentials};
pub use permissions::Permission;
pub use principal::{Principal, PrincipalId};
pub use roles::Role;
