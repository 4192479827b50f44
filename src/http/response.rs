//! Error responses.
//!
//! # Responsibilities
//! - Render a [`GuardError`] as a JSON `{"error": ...}` envelope
//! - Map the error classification to the HTTP status
//! - Record internal failures in the log and nothing else
//!
//! # Design Decisions
//! - Internal failures never leak their detail to the caller
//! - `WWW-Authenticate: Bearer` accompanies every invalid-token response

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::GuardError;

/// JSON envelope carried by every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!(error = %self, reason = self.reason(), "request failed");
        }

        let status = self.classification().status();
        let mut response = (
            status,
            Json(ErrorEnvelope {
                error: self.public_message(),
            }),
        )
            .into_response();

        if matches!(self, GuardError::InvalidToken) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_token_advertises_bearer() {
        let response = GuardError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid or missing authentication token");
    }

    #[tokio::test]
    async fn test_authentication_required_has_no_challenge() {
        let response = GuardError::AuthenticationRequired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[tokio::test]
    async fn test_internal_response_is_generic() {
        let response = GuardError::internal("pq: relation \"users\" does not exist").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], crate::error::INTERNAL_MESSAGE);
    }
}
