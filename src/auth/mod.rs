//! Identity subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → token.rs (shape and plaintext checks)
//!     → resolver.rs (CredentialResolver lookup, scoped)
//!     → identity.rs (Identity or the anonymous sentinel)
//!     → context.rs (attached once to the request)
//!     → guards in security::access_control read it back
//! ```
//!
//! # Design Decisions
//! - Missing credentials are not a failure; the identity is anonymous
//! - Lookup backends sit behind traits so storage stays outside this crate
//! - The identity is immutable once attached to a request

pub mod context;
pub mod identity;
pub mod resolver;
pub mod token;

pub use context::RequestContext;
pub use identity::{Identity, PermissionSet, UserId};
pub use resolver::{CredentialResolver, LookupError, PermissionStore};
pub use token::Scope;
