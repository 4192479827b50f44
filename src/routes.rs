//! Route table served by the binary.
//!
//! The handlers stand in for the forum API: they report who called and what
//! was asked, leaving forum storage to the service that embeds this crate.

use axum::{
    extract::State,
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::context::RequestContext;
use crate::http::response::ErrorEnvelope;
use crate::security::access_control::Guards;

#[derive(Debug, Clone)]
struct SystemInfo {
    environment: String,
}

/// Build the route table, guarding each route as the API requires.
pub fn routes(guards: &Guards, environment: &str) -> Router {
    Router::new()
        .route("/v1/healthcheck", get(healthcheck))
        .route("/v1/me", guards.authenticated(get(current_user)))
        .route("/v1/forum", guards.permission("forum:read", get(list_forums)))
        .route("/v1/forum", guards.permission("forum:write", post(create_forum)))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(SystemInfo {
            environment: environment.to_string(),
        })
}

async fn healthcheck(State(info): State<SystemInfo>) -> Json<Value> {
    Json(json!({
        "status": "available",
        "system_info": {
            "environment": info.environment,
            "version": env!("CARGO_PKG_VERSION"),
        },
    }))
}

async fn current_user(ctx: RequestContext) -> Json<Value> {
    Json(json!({ "user": ctx.identity() }))
}

async fn list_forums(ctx: RequestContext) -> Json<Value> {
    Json(json!({
        "forums": [],
        "requested_by": ctx.identity().id,
    }))
}

async fn create_forum(ctx: RequestContext, Json(forum): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({
            "forum": forum,
            "created_by": ctx.identity().id,
        })),
    )
}

async fn not_found() -> (StatusCode, Json<ErrorEnvelope>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorEnvelope {
            error: "the requested resource could not be found".to_string(),
        }),
    )
}

async fn method_not_allowed(method: Method) -> (StatusCode, Json<ErrorEnvelope>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorEnvelope {
            error: format!("the {method} method is not supported for this resource"),
        }),
    )
}
