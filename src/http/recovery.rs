//! Panic containment.
//!
//! A panic while serving a request becomes one internal-error response for
//! that request. The response asks the client to close the connection, since
//! state tied to it may be half-written.

use std::any::Any;

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::error::GuardError;
use crate::observability::metrics;

type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Layer catching panics from everything it wraps.
pub fn recover_panic_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    metrics::record_panic();
    let mut response = GuardError::Panic(detail).into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
