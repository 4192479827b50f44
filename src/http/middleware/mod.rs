//! Request stages built on `axum::middleware::from_fn_with_state`.

pub mod authenticate;
pub mod cors;

pub use authenticate::{authenticate, resolve_identity, vary_on_authorization, AuthState};
pub use cors::{cors_middleware, vary_on_origin, CorsState};
