//! In-memory account store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::auth::identity::{Identity, PermissionSet, UserId};
use crate::auth::resolver::{CredentialResolver, LookupError, PermissionStore};
use crate::auth::token::Scope;
use crate::config::AccountConfig;

#[derive(Debug, Clone)]
struct Account {
    activated: bool,
    permissions: PermissionSet,
}

/// Accounts, scoped tokens and permission grants held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<UserId, Account>>,
    tokens: RwLock<HashMap<(Scope, String), UserId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from configured accounts, each with one authentication token.
    pub fn from_accounts(accounts: &[AccountConfig]) -> Self {
        let store = Self::new();
        for account in accounts {
            store.insert_account(
                UserId(account.id),
                account.activated,
                account.permissions.iter().cloned().collect(),
            );
            store.insert_token(Scope::Authentication, &account.token, UserId(account.id));
        }
        store
    }

    pub fn insert_account(&self, id: UserId, activated: bool, permissions: PermissionSet) {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        accounts.insert(
            id,
            Account {
                activated,
                permissions,
            },
        );
    }

    pub fn insert_token(&self, scope: Scope, token: &str, id: UserId) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.insert((scope, token.to_string()), id);
    }

    /// Replace the permission grants of an existing account.
    pub fn set_permissions(&self, id: UserId, permissions: PermissionSet) -> Result<(), LookupError> {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        let account = accounts.get_mut(&id).ok_or(LookupError::NotFound)?;
        account.permissions = permissions;
        Ok(())
    }

    /// Remove every token of `scope` owned by `id`.
    pub fn revoke_tokens(&self, scope: Scope, id: UserId) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.retain(|(token_scope, _), owner| !(*token_scope == scope && *owner == id));
    }
}

#[async_trait]
impl CredentialResolver for MemoryStore {
    async fn resolve(&self, scope: Scope, token: &str) -> Result<Identity, LookupError> {
        let id = {
            let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
            *tokens
                .get(&(scope, token.to_string()))
                .ok_or(LookupError::NotFound)?
        };

        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        let account = accounts.get(&id).ok_or(LookupError::NotFound)?;
        Ok(Identity::user(id, account.activated, account.permissions.clone()))
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn permissions_for(&self, user: UserId) -> Result<PermissionSet, LookupError> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        accounts
            .get(&user)
            .map(|account| account.permissions.clone())
            .ok_or(LookupError::NotFound)
    }
}
