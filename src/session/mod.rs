//! Auth and checkout collaborator contracts. The core is constructed with
//! explicit references to these rather than reaching for ambient globals.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/// Opaque per-user identifier supplied by the auth collaborator. All store
/// records are scoped to exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplies the current user identity. Ledger and dashboard stay inert
/// until a verified identity is present.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
    fn is_email_verified(&self) -> bool;

    /// The current user, but only once their email is verified.
    fn verified_user(&self) -> Option<UserId> {
        if self.is_email_verified() {
            self.current_user()
        } else {
            None
        }
    }
}

/// Fixed-identity provider used by tests and embedding hosts that manage
/// sign-in themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user: Option<UserId>,
    verified: bool,
}

impl StaticAuth {
    pub fn signed_in(user: impl Into<String>) -> Self {
        Self {
            user: Some(UserId::new(user)),
            verified: true,
        }
    }

    pub fn unverified(user: impl Into<String>) -> Self {
        Self {
            user: Some(UserId::new(user)),
            verified: false,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

impl AuthProvider for StaticAuth {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }

    fn is_email_verified(&self) -> bool {
        self.verified
    }
}

/// Payment-checkout collaborator: one opaque call that returns a redirect
/// URL. Nothing in the ledger depends on it beyond this seam.
pub trait CheckoutProvider: Send + Sync {
    fn start_checkout(&self, user: &UserId, plan: &str) -> Result<String, LedgerError>;
}
