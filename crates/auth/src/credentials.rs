//! Pluggable login gate.
//!
//! How credentials are stored is up to the implementation; the rest of the
//! system only ever sees the resolved [`Principal`].

use std::collections::HashMap;

use thiserror::Error;

use crate::{Principal, PrincipalId, Role, RolePolicy};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("invalid username or secret")]
    InvalidCredentials,

    #[error("credential backend unavailable: {0}")]
    Unavailable(String),
}

/// Verifies a login attempt and resolves the caller.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, secret: &str) -> Result<Principal, CredentialError>;
}

#[derive(Debug, Clone)]
struct Account {
    principal_id: PrincipalId,
    secret: String,
    display_name: String,
    roles: Vec<Role>,
}

/// In-process credential table for development and tests.
///
/// Usernames are matched case-insensitively; secrets exactly.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    policy: RolePolicy,
    accounts: HashMap<String, Account>,
}

impl StaticCredentials {
    pub fn new(policy: RolePolicy) -> Self {
        Self {
            policy,
            accounts: HashMap::new(),
        }
    }

    pub fn with_account(
        mut self,
        username: &str,
        secret: impl Into<String>,
        display_name: impl Into<String>,
        roles: Vec<Role>,
    ) -> Self {
        self.accounts.insert(
            username.trim().to_lowercase(),
            Account {
                principal_id: PrincipalId::new(),
                secret: secret.into(),
                display_name: display_name.into(),
                roles,
            },
        );
        self
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, secret: &str) -> Result<Principal, CredentialError> {
        let account = self
            .accounts
            .get(&username.trim().to_lowercase())
            .filter(|a| a.secret == secret)
            .ok_or_else(|| {
                tracing::warn!(username, "login rejected");
                CredentialError::InvalidCredentials
            })?;

        Ok(Principal::with_roles(
            account.principal_id,
            account.display_name.clone(),
            account.roles.clone(),
            &self.policy,
        ))
    }
}
