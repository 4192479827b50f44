//! Request guard pipeline for the forum API.
//!
//! Every request passes panic recovery, per-client rate limiting and bearer
//! token authentication before the route's guards decide whether its handler
//! runs.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routes;
pub mod security;
pub mod store;

pub use config::GuardConfig;
pub use error::{Classification, GuardError};
pub use http::{Collaborators, HttpServer, Pipeline};
pub use lifecycle::Shutdown;
