//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages produce:
//!     → logging.rs (structured log events; internal failures only)
//!     → metrics.rs (counters and gauges for every rejection)
//!
//! Consumers:
//!     → stdout (JSON or pretty)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Expected rejections (rate limit, auth, guards) are counted, not logged
//! - Request spans come from tower-http's TraceLayer
//! - Request IDs are assigned before any other stage runs

pub mod logging;
pub mod metrics;
