//! Route guards.
//!
//! Guards nest: a permission check first requires activation, which first
//! requires authentication. The first failing check short-circuits the
//! request, so a route guarded by a permission never restates the weaker
//! checks.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};

use crate::auth::context::RequestContext;
use crate::auth::identity::{Identity, PermissionSet};
use crate::auth::resolver::{LookupError, PermissionStore};
use crate::error::GuardError;
use crate::observability::metrics;

/// A single authorization requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Authenticated,
    Activated,
    Permission(String),
}

impl Guard {
    /// Run this guard and every weaker one it implies.
    pub async fn check(
        &self,
        ctx: &RequestContext,
        permissions: &dyn PermissionStore,
    ) -> Result<(), GuardError> {
        match self {
            Guard::Authenticated => require_authenticated(ctx.identity()),
            Guard::Activated => require_activated(ctx.identity()),
            Guard::Permission(code) => require_permission(ctx.identity(), permissions, code).await,
        }
    }
}

fn require_authenticated(identity: &Identity) -> Result<(), GuardError> {
    if identity.is_anonymous() {
        return Err(GuardError::AuthenticationRequired);
    }
    Ok(())
}

fn require_activated(identity: &Identity) -> Result<(), GuardError> {
    require_authenticated(identity)?;
    if !identity.activated {
        return Err(GuardError::AccountInactive);
    }
    Ok(())
}

async fn require_permission(
    identity: &Identity,
    permissions: &dyn PermissionStore,
    code: &str,
) -> Result<(), GuardError> {
    require_activated(identity)?;
    let Some(user) = identity.id else {
        return Err(GuardError::AuthenticationRequired);
    };

    let held = match permissions.permissions_for(user).await {
        Ok(held) => held,
        // A user with no grants has no permission rows.
        Err(LookupError::NotFound) => PermissionSet::new(),
        Err(e) => return Err(GuardError::internal(e)),
    };
    if !held.include(code) {
        return Err(GuardError::NotPermitted);
    }
    Ok(())
}

#[derive(Clone)]
struct GuardState {
    guard: Guard,
    permissions: Arc<dyn PermissionStore>,
}

async fn guard_middleware(
    State(state): State<GuardState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let outcome = match RequestContext::get(request.extensions()) {
        Ok(ctx) => state.guard.check(ctx, state.permissions.as_ref()).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => next.run(request).await,
        Err(e) => {
            metrics::record_guard_denied(e.reason());
            e.into_response()
        }
    }
}

/// Wraps route handlers with guards backed by a shared permission store.
#[derive(Clone)]
pub struct Guards {
    permissions: Arc<dyn PermissionStore>,
}

impl Guards {
    pub fn new(permissions: Arc<dyn PermissionStore>) -> Self {
        Self { permissions }
    }

    /// Apply `guard` in front of every handler of `route`.
    pub fn require<S>(&self, guard: Guard, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let state = GuardState {
            guard,
            permissions: self.permissions.clone(),
        };
        route.route_layer(middleware::from_fn_with_state(state, guard_middleware))
    }

    pub fn authenticated<S>(&self, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.require(Guard::Authenticated, route)
    }

    pub fn activated<S>(&self, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.require(Guard::Activated, route)
    }

    pub fn permission<S>(&self, code: impl Into<String>, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.require(Guard::Permission(code.into()), route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::{Extensions, StatusCode};
    use axum::{routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    use crate::auth::identity::UserId;

    struct FixedPermissions {
        codes: PermissionSet,
        calls: AtomicUsize,
    }

    impl FixedPermissions {
        fn new(codes: &[&str]) -> Self {
            Self {
                codes: codes.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PermissionStore for FixedPermissions {
        async fn permissions_for(&self, _user: UserId) -> Result<PermissionSet, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.codes.clone())
        }
    }

    struct BrokenPermissions;

    #[async_trait]
    impl PermissionStore for BrokenPermissions {
        async fn permissions_for(&self, _user: UserId) -> Result<PermissionSet, LookupError> {
            Err(LookupError::backend("permissions table unavailable"))
        }
    }

    fn ctx(identity: Identity) -> RequestContext {
        let mut ext = Extensions::new();
        RequestContext::attach(&mut ext, identity).unwrap();
        RequestContext::get(&ext).unwrap().clone()
    }

    fn user(activated: bool) -> Identity {
        Identity::user(UserId(42), activated, PermissionSet::new())
    }

    #[tokio::test]
    async fn test_authenticated_rejects_anonymous() {
        let store = FixedPermissions::new(&[]);
        let err = Guard::Authenticated
            .check(&ctx(Identity::anonymous()), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::AuthenticationRequired));

        Guard::Authenticated.check(&ctx(user(false)), &store).await.unwrap();
    }

    #[tokio::test]
    async fn test_activated_implies_authenticated() {
        let store = FixedPermissions::new(&[]);
        let err = Guard::Activated
            .check(&ctx(Identity::anonymous()), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::AuthenticationRequired));

        let err = Guard::Activated.check(&ctx(user(false)), &store).await.unwrap_err();
        assert!(matches!(err, GuardError::AccountInactive));

        Guard::Activated.check(&ctx(user(true)), &store).await.unwrap();
    }

    #[tokio::test]
    async fn test_permission_membership() {
        let guard = Guard::Permission("forum:write".into());

        let without = FixedPermissions::new(&["forum:read"]);
        let err = guard.check(&ctx(user(true)), &without).await.unwrap_err();
        assert!(matches!(err, GuardError::NotPermitted));

        let with = FixedPermissions::new(&["forum:read", "forum:write"]);
        guard.check(&ctx(user(true)), &with).await.unwrap();
    }

    #[tokio::test]
    async fn test_permission_denies_inactive_holder_without_lookup() {
        let store = FixedPermissions::new(&["forum:write"]);
        let err = Guard::Permission("forum:write".into())
            .check(&ctx(user(false)), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::AccountInactive));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_permission_lookup_failure_is_internal() {
        let err = Guard::Permission("forum:write".into())
            .check(&ctx(user(true)), &BrokenPermissions)
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::Internal(_)));
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_activated_route_never_reaches_handler_for_inactive_account() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let guards = Guards::new(Arc::new(FixedPermissions::new(&[])));
        let app: Router = Router::new().route(
            "/",
            guards.activated(get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "reached"
                }
            })),
        );

        let send = |identity: Identity| {
            let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
            RequestContext::attach(request.extensions_mut(), identity).unwrap();
            app.clone().oneshot(request)
        };

        let res = send(Identity::anonymous()).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = send(user(false)).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let res = send(user(true)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
