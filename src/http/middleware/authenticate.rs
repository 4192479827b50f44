//! Bearer token authentication.
//!
//! Resolves the `Authorization` header to an [`Identity`] and attaches it to
//! the request. Requests without the header continue as anonymous; the route
//! guards decide whether that is acceptable.
//!
//! Responses vary on `Authorization`. That header comes from
//! [`vary_on_authorization`], which the pipeline mounts outside panic
//! recovery so that every response carries it.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::auth::context::RequestContext;
use crate::auth::identity::Identity;
use crate::auth::resolver::{CredentialResolver, LookupError};
use crate::auth::token::{self, Scope};
use crate::error::GuardError;
use crate::observability::metrics;

/// State required for authentication.
#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<dyn CredentialResolver>,
}

/// Resolve a raw `Authorization` header value to an identity.
pub async fn resolve_identity(
    header: Option<&HeaderValue>,
    resolver: &dyn CredentialResolver,
) -> Result<Identity, GuardError> {
    let Some(header) = header.filter(|value| !value.is_empty()) else {
        return Ok(Identity::anonymous());
    };

    let value = header.to_str().map_err(|_| GuardError::InvalidToken)?;
    let token = token::parse_bearer(value).ok_or(GuardError::InvalidToken)?;
    token::validate_plaintext(token).map_err(|_| GuardError::InvalidToken)?;

    match resolver.resolve(Scope::Authentication, token).await {
        Ok(identity) => Ok(identity),
        Err(LookupError::NotFound) => Err(GuardError::InvalidToken),
        Err(e) => Err(GuardError::internal(e)),
    }
}

pub async fn authenticate(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = request.headers().get(header::AUTHORIZATION).cloned();

    let outcome = resolve_identity(header.as_ref(), state.resolver.as_ref())
        .await
        .and_then(|identity| RequestContext::attach(request.extensions_mut(), identity));

    match outcome {
        Ok(()) => next.run(request).await,
        Err(e) => {
            metrics::record_auth_failure(e.reason());
            e.into_response()
        }
    }
}

/// Append `Vary: Authorization` to every response passing through.
pub fn vary_on_authorization() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::appending(header::VARY, HeaderValue::from_static("Authorization"))
}
