//! HTTP server setup.
//!
//! # Responsibilities
//! - Assemble the request pipeline around the application's routes
//! - Own the rate limit registry and its janitor for the process lifetime
//! - Bind the router to a listener with peer addresses attached
//! - Drain in-flight requests on shutdown
//!
//! # Pipeline
//! ```text
//! request id → trace span → Vary → panic recovery → CORS → rate limit → authenticate → router → guards → handler
//! ```
//!
//! `Vary` sits outside panic recovery so the response built for a panic
//! carries it too.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{body::Body, http::Request, middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::auth::resolver::{CredentialResolver, PermissionStore};
use crate::config::GuardConfig;
use crate::http::middleware::{
    authenticate, cors_middleware, vary_on_authorization, vary_on_origin, AuthState, CorsState,
};
use crate::http::recovery::recover_panic_layer;
use crate::lifecycle::shutdown::{wait as wait_for_shutdown, Shutdown};
use crate::security::access_control::Guards;
use crate::security::janitor::{spawn_janitor, JanitorSettings};
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};

/// Lookups the pipeline delegates to storage.
#[derive(Clone)]
pub struct Collaborators {
    pub credentials: Arc<dyn CredentialResolver>,
    pub permissions: Arc<dyn PermissionStore>,
}

impl Collaborators {
    /// Use one store for both credential and permission lookups.
    pub fn from_store<T>(store: Arc<T>) -> Self
    where
        T: CredentialResolver + PermissionStore + 'static,
    {
        Self {
            credentials: store.clone(),
            permissions: store,
        }
    }
}

/// The stages wrapped around every route, with their shared state.
pub struct Pipeline {
    limiter: RateLimiter,
    janitor: JanitorSettings,
    auth: AuthState,
    cors: CorsState,
    guards: Guards,
}

impl Pipeline {
    pub fn new(config: &GuardConfig, collaborators: Collaborators) -> Self {
        Self {
            limiter: RateLimiter::from_config(&config.rate_limit),
            janitor: JanitorSettings::from(&config.rate_limit),
            auth: AuthState {
                resolver: collaborators.credentials,
            },
            cors: CorsState::new(config.cors.trusted_origins.clone()),
            guards: Guards::new(collaborators.permissions),
        }
    }

    pub fn guards(&self) -> &Guards {
        &self.guards
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Wrap `routes` in every pipeline stage.
    pub fn wrap(&self, routes: Router) -> Router {
        routes
            .layer(middleware::from_fn_with_state(self.auth.clone(), authenticate))
            .layer(middleware::from_fn_with_state(
                self.limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn_with_state(self.cors.clone(), cors_middleware))
            .layer(recover_panic_layer())
            .layer(vary_on_authorization())
            .layer(vary_on_origin())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Start evicting idle clients. Nothing is spawned when rate limiting is off.
    pub fn spawn_janitor(&self, shutdown: broadcast::Receiver<()>) -> Option<JoinHandle<()>> {
        if !self.limiter.enabled() {
            return None;
        }
        Some(spawn_janitor(
            self.limiter.registry().clone(),
            self.janitor,
            shutdown,
        ))
    }
}

fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    )
}

/// HTTP server for the guarded API.
pub struct HttpServer {
    router: Router,
    config: GuardConfig,
    pipeline: Pipeline,
}

impl HttpServer {
    /// Build the server. `routes` receives the guards to wrap handlers with.
    pub fn new<F>(config: GuardConfig, collaborators: Collaborators, routes: F) -> Self
    where
        F: FnOnce(&Guards) -> Router,
    {
        let pipeline = Pipeline::new(&config, collaborators);
        let router = pipeline.wrap(routes(pipeline.guards()));
        Self {
            router,
            config,
            pipeline,
        }
    }

    /// The fully wrapped router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then drain and stop the janitor.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit_enabled = self.pipeline.limiter.enabled(),
            "HTTP server starting"
        );

        let serve_shutdown = shutdown.subscribe();
        let janitor = self.pipeline.spawn_janitor(shutdown.subscribe());

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(serve_shutdown))
            .await;

        shutdown.trigger();
        if let Some(handle) = janitor {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Rate limit janitor failed");
            }
        }

        tracing::info!("HTTP server stopped");
        result
    }
}
