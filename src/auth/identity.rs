//! Resolved principals.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of opaque capability codes such as `forum:write`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `code` is a member of the set.
    pub fn include(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The principal behind a request.
///
/// `id == None` marks the anonymous sentinel; it is never activated and holds
/// no permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Option<UserId>,
    pub activated: bool,
    pub permissions: PermissionSet,
}

impl Identity {
    /// The sentinel attached to requests without credentials.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            activated: false,
            permissions: PermissionSet::new(),
        }
    }

    pub fn user(id: UserId, activated: bool, permissions: PermissionSet) -> Self {
        Self {
            id: Some(id),
            activated,
            permissions,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_sentinel() {
        let anon = Identity::anonymous();
        assert!(anon.is_anonymous());
        assert!(!anon.activated);
        assert!(anon.permissions.is_empty());
    }

    #[test]
    fn test_permission_membership() {
        let perms: PermissionSet = ["forum:read", "forum:write"].into_iter().collect();
        assert!(perms.include("forum:write"));
        assert!(!perms.include("forum:admin"));
        assert_eq!(perms.len(), 2);
    }
}
