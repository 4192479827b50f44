//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address attached)
//!     → server.rs (pipeline assembly, serve, graceful shutdown)
//!     → recovery.rs (panic containment)
//!     → middleware/ (CORS, authentication)
//!     → routes + guards
//!     → response.rs (error envelopes for every rejected request)
//! ```

pub mod middleware;
pub mod recovery;
pub mod response;
pub mod server;

pub use server::{Collaborators, HttpServer, Pipeline};
