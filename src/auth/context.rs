//! Request-scoped identity carrier.
//!
//! The authentication stage attaches exactly one [`RequestContext`] to each
//! request's extensions. Later stages read it through [`RequestContext::get`]
//! or the axum extractor; reading before attachment is an ordering bug in the
//! pipeline and surfaces as an internal failure.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts, http::Extensions};

use crate::auth::identity::Identity;
use crate::error::GuardError;

#[derive(Debug, Clone)]
pub struct RequestContext {
    identity: Arc<Identity>,
}

impl RequestContext {
    /// Attach `identity` to a request. Fails if one is already attached.
    pub fn attach(extensions: &mut Extensions, identity: Identity) -> Result<(), GuardError> {
        if extensions.get::<RequestContext>().is_some() {
            return Err(GuardError::ContextAlreadySet);
        }
        extensions.insert(RequestContext {
            identity: Arc::new(identity),
        });
        Ok(())
    }

    /// Read the context attached by authentication.
    pub fn get(extensions: &Extensions) -> Result<&RequestContext, GuardError> {
        extensions
            .get::<RequestContext>()
            .ok_or(GuardError::MissingContext)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        RequestContext::get(&parts.extensions).cloned()
    }
}
