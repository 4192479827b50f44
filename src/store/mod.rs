//! Account storage backends.
//!
//! The pipeline only sees the [`CredentialResolver`](crate::auth::CredentialResolver)
//! and [`PermissionStore`](crate::auth::PermissionStore) traits. The in-memory
//! store backs the binary and the tests; a database-backed store plugs in
//! through the same traits.

pub mod memory;

pub use memory::MemoryStore;
