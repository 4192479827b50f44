//! Cross-origin allowance for trusted origins.
//!
//! `Vary: Origin` is added by [`vary_on_origin`] outside panic recovery,
//! not by the middleware itself.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tower_http::set_header::SetResponseHeaderLayer;

/// Origins allowed to read responses cross-origin.
#[derive(Debug, Clone, Default)]
pub struct CorsState {
    pub trusted_origins: Arc<Vec<String>>,
}

impl CorsState {
    pub fn new(trusted_origins: Vec<String>) -> Self {
        Self {
            trusted_origins: Arc::new(trusted_origins),
        }
    }

    fn allows(&self, origin: &str) -> bool {
        self.trusted_origins.iter().any(|trusted| trusted == origin)
    }
}

pub async fn cors_middleware(
    State(state): State<CorsState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .filter(|origin| origin.to_str().is_ok_and(|o| state.allows(o)))
        .cloned();

    let mut response = next.run(request).await;
    if let Some(origin) = origin {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    response
}

/// Append `Vary: Origin` to every response passing through.
pub fn vary_on_origin() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::appending(header::VARY, HeaderValue::from_static("Origin"))
}
