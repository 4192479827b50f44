//! Per-client rate limiting.
//!
//! Each client key (the peer IP) owns a token bucket inside a shared
//! [`ClientRegistry`]. All map and bucket mutation happens under one mutex;
//! the critical section only does O(1) bucket arithmetic, so admission
//! decisions for a key are observed in lock-acquisition order.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::error::GuardError;
use crate::observability::metrics;

/// A lazily refilled token bucket.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket.
    pub fn new(capacity: f64, refill_per_sec: f64, now: Instant) -> Self {
        Self {
            capacity,
            refill_per_sec,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Refill for the time elapsed since the last call, then take one token.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if now > self.last_refill {
            self.last_refill = now;
        }

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}

/// Rate and burst applied to every new bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketSettings {
    pub rate: f64,
    pub burst: u32,
}

impl From<&RateLimitConfig> for BucketSettings {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            rate: config.requests_per_second,
            burst: config.burst,
        }
    }
}

/// Rate limiting state for one client key.
#[derive(Debug)]
pub struct ClientLimiterEntry {
    pub bucket: TokenBucket,
    pub last_seen: Instant,
}

/// Concurrent map from client key to its limiter state.
#[derive(Debug)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<String, ClientLimiterEntry>>,
    settings: BucketSettings,
}

impl ClientRegistry {
    pub fn new(settings: BucketSettings) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            settings,
        }
    }

    pub fn settings(&self) -> BucketSettings {
        self.settings
    }

    // The guarded map is consistent after any panic: entries are only
    // inserted whole or removed whole.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, ClientLimiterEntry>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit one request from `key` at the current time.
    pub fn admit(&self, key: &str) -> bool {
        self.admit_at(key, Instant::now())
    }

    /// Admit one request from `key` at `now`.
    pub fn admit_at(&self, key: &str, now: Instant) -> bool {
        let settings = self.settings;
        let mut clients = self.lock();

        let entry = clients
            .entry(key.to_string())
            .or_insert_with(|| ClientLimiterEntry {
                bucket: TokenBucket::new(settings.burst as f64, settings.rate, now),
                last_seen: now,
            });
        if now > entry.last_seen {
            entry.last_seen = now;
        }

        entry.bucket.try_acquire(now)
    }

    /// Evict every client not seen within `window`. Returns the number evicted.
    pub fn sweep(&self, window: Duration) -> usize {
        self.sweep_at(Instant::now(), window)
    }

    pub fn sweep_at(&self, now: Instant, window: Duration) -> usize {
        let mut clients = self.lock();
        let before = clients.len();
        clients.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= window);
        before - clients.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Current token count for `key`, if tracked.
    pub fn tokens(&self, key: &str) -> Option<f64> {
        self.lock().get(key).map(|entry| entry.bucket.tokens())
    }
}

/// Admission check in front of the registry.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    registry: Arc<ClientRegistry>,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(registry: Arc<ClientRegistry>, enabled: bool) -> Self {
        Self { registry, enabled }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            Arc::new(ClientRegistry::new(BucketSettings::from(config))),
            config.enabled,
        )
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Whether a request from `key` may proceed. Always true when disabled.
    pub fn admit(&self, key: &str) -> bool {
        !self.enabled || self.registry.admit(key)
    }
}

/// Client key for rate limiting: the peer's IP address.
pub fn client_key(request: &Request<Body>) -> Result<String, GuardError> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .ok_or_else(|| {
            GuardError::MalformedClientIdentity("no peer address on request".to_string())
        })
}

/// Middleware rejecting clients that exhausted their bucket.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.enabled() {
        return next.run(request).await;
    }

    let key = match client_key(&request) {
        Ok(key) => key,
        Err(e) => return e.into_response(),
    };

    if limiter.admit(&key) {
        next.run(request).await
    } else {
        metrics::record_rate_limited();
        GuardError::RateLimited.into_response()
    }
}
