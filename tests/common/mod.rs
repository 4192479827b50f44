//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, Response},
    routing::get,
    Router,
};
use forum_guard::auth::{PermissionSet, Scope, UserId};
use forum_guard::config::GuardConfig;
use forum_guard::store::MemoryStore;
use forum_guard::{routes, Collaborators, HttpServer};

pub const ACTIVE_WRITER: &str = "WRITERWRITERWRITERWRITER01";
pub const ACTIVE_READER: &str = "READERREADERREADERREADER01";
pub const INACTIVE_WRITER: &str = "INACTIVEINACTIVEINACTIVE01";
pub const UNKNOWN: &str = "UNKNOWNUNKNOWNUNKNOWNUNKN1";

/// Store with three accounts: an activated writer, an activated reader and
/// an inactive account that nevertheless holds `forum:write`.
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    let accounts: [(i64, &str, bool, &[&str]); 3] = [
        (1, ACTIVE_WRITER, true, &["forum:read", "forum:write"]),
        (2, ACTIVE_READER, true, &["forum:read"]),
        (3, INACTIVE_WRITER, false, &["forum:read", "forum:write"]),
    ];
    for (id, token, activated, codes) in accounts {
        let permissions: PermissionSet = codes.iter().copied().collect();
        store.insert_account(UserId(id), activated, permissions);
        store.insert_token(Scope::Authentication, token, UserId(id));
    }
    Arc::new(store)
}

#[allow(dead_code)]
async fn explode() -> &'static str {
    panic!("handler exploded")
}

/// Server over the binary's routes plus `/panic`, which always panics.
#[allow(dead_code)]
pub fn server(config: GuardConfig) -> HttpServer {
    HttpServer::new(config, Collaborators::from_store(seeded_store()), |guards| {
        routes::routes(guards, "test").merge(
            Router::new().route("/panic", get(explode)),
        )
    })
}

/// Build a request coming from `peer`, optionally with a bearer token.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, peer: &str, token: Option<&str>) -> Request<Body> {
    let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(addr));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if method == "POST" {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        return builder.body(Body::from(r#"{"name":"general"}"#)).unwrap();
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Every `Vary` value on a response, in order.
#[allow(dead_code)]
pub fn vary(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}
