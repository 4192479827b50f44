//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-IP token bucket admission)
//!     → [authentication attaches the identity]
//!     → access_control.rs (per-route guards)
//!     → Handler
//!
//! Background:
//!     janitor.rs (evicts idle rate limit state)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a request whose client key cannot be derived is rejected
//! - One coarse lock over the client map; it is held only for bucket
//!   arithmetic or a sweep, never across an await. Sharding by key hash is
//!   the next step if contention shows up, with identical decisions.
//! - No lock is held while credential or permission lookups run

pub mod access_control;
pub mod janitor;
pub mod rate_limit;

pub use access_control::{Guard, Guards};
pub use janitor::{spawn_janitor, Janitor, JanitorSettings};
pub use rate_limit::{BucketSettings, ClientRegistry, RateLimiter, TokenBucket};
