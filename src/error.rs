//! Failure taxonomy for the request pipeline.
//!
//! Every stage reports failures as a [`GuardError`]. The stage that detects a
//! failure picks the variant; nothing downstream rewrites it. The variant's
//! [`Classification`] decides the HTTP status of the response.

use axum::http::StatusCode;

/// Boxed error produced by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message shown to callers for every internal failure.
pub const INTERNAL_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

/// Status category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    BadRequest,
    Unauthorized,
    Forbidden,
    TooManyRequests,
    InternalError,
}

impl Classification {
    /// HTTP status code for this category.
    pub fn status(self) -> StatusCode {
        match self {
            Classification::BadRequest => StatusCode::BAD_REQUEST,
            Classification::Unauthorized => StatusCode::UNAUTHORIZED,
            Classification::Forbidden => StatusCode::FORBIDDEN,
            Classification::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Classification::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A classified pipeline failure.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("invalid or missing authentication token")]
    InvalidToken,

    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,

    #[error("your user account must be activated to access this resource")]
    AccountInactive,

    #[error("your user account doesn't have the necessary permissions to access this resource")]
    NotPermitted,

    /// The peer address needed for rate limiting could not be derived.
    #[error("client identity unavailable: {0}")]
    MalformedClientIdentity(String),

    /// A stage read the request context before authentication attached it.
    #[error("missing identity in the request context")]
    MissingContext,

    /// Authentication attached an identity twice to the same request.
    #[error("identity already attached to the request context")]
    ContextAlreadySet,

    /// A handler or stage panicked while serving the request.
    #[error("panic while serving request: {0}")]
    Panic(String),

    /// An external collaborator failed.
    #[error(transparent)]
    Internal(BoxError),
}

impl GuardError {
    /// Wrap a collaborator failure.
    pub fn internal(err: impl Into<BoxError>) -> Self {
        GuardError::Internal(err.into())
    }

    pub fn classification(&self) -> Classification {
        match self {
            GuardError::RateLimited => Classification::TooManyRequests,
            GuardError::InvalidToken | GuardError::AuthenticationRequired => {
                Classification::Unauthorized
            }
            GuardError::AccountInactive | GuardError::NotPermitted => Classification::Forbidden,
            GuardError::MalformedClientIdentity(_)
            | GuardError::MissingContext
            | GuardError::ContextAlreadySet
            | GuardError::Panic(_)
            | GuardError::Internal(_) => Classification::InternalError,
        }
    }

    /// Whether this failure is an internal one that must be logged.
    pub fn is_internal(&self) -> bool {
        self.classification() == Classification::InternalError
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            GuardError::RateLimited => "rate_limited",
            GuardError::InvalidToken => "invalid_token",
            GuardError::AuthenticationRequired => "authentication_required",
            GuardError::AccountInactive => "account_inactive",
            GuardError::NotPermitted => "not_permitted",
            GuardError::MalformedClientIdentity(_) => "malformed_client_identity",
            GuardError::MissingContext | GuardError::ContextAlreadySet => "context",
            GuardError::Panic(_) => "panic",
            GuardError::Internal(_) => "internal",
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_mapping() {
        assert_eq!(GuardError::RateLimited.classification().status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(GuardError::InvalidToken.classification().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            GuardError::AuthenticationRequired.classification().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(GuardError::AccountInactive.classification().status(), StatusCode::FORBIDDEN);
        assert_eq!(GuardError::NotPermitted.classification().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            GuardError::MalformedClientIdentity("no peer".into()).classification().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(Classification::BadRequest.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_message_hides_detail() {
        let err = GuardError::internal("connection refused by db at 10.1.2.3");
        assert!(err.is_internal());
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);
        assert!(err.to_string().contains("connection refused"));

        let err = GuardError::Panic("index out of bounds".into());
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn test_expected_failures_are_not_internal() {
        for err in [
            GuardError::RateLimited,
            GuardError::InvalidToken,
            GuardError::AuthenticationRequired,
            GuardError::AccountInactive,
            GuardError::NotPermitted,
        ] {
            assert!(!err.is_internal());
            assert_eq!(err.public_message(), err.to_string());
        }
    }
}
