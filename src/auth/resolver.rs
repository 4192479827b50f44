//! Contracts for the lookups the pipeline delegates to storage.
//!
//! Implementations own their own timeouts; the pipeline never holds a lock
//! while awaiting them.

use async_trait::async_trait;

use crate::auth::identity::{Identity, PermissionSet, UserId};
use crate::auth::token::Scope;
use crate::error::BoxError;

/// Failure of a storage lookup.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// No record matched the key.
    #[error("record not found")]
    NotFound,
    /// The backend failed.
    #[error("lookup backend failed: {0}")]
    Backend(#[source] BoxError),
}

impl LookupError {
    pub fn backend(err: impl Into<BoxError>) -> Self {
        LookupError::Backend(err.into())
    }
}

/// Resolves a plaintext token issued for `scope` to the identity owning it.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, scope: Scope, token: &str) -> Result<Identity, LookupError>;
}

/// Returns the current permission codes held by a user.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn permissions_for(&self, user: UserId) -> Result<PermissionSet, LookupError>;
}
