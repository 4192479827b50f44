//! Background eviction of idle rate-limit state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::rate_limit::ClientRegistry;

/// How often the janitor sweeps and how long a client may stay idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JanitorSettings {
    pub interval: Duration,
    pub window: Duration,
}

impl From<&RateLimitConfig> for JanitorSettings {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            interval: config.sweep_interval(),
            window: config.eviction_window(),
        }
    }
}

pub struct Janitor {
    registry: Arc<ClientRegistry>,
    settings: JanitorSettings,
}

impl Janitor {
    pub fn new(registry: Arc<ClientRegistry>, settings: JanitorSettings) -> Self {
        Self { registry, settings }
    }

    /// Sweep every interval until `shutdown` fires or its sender is dropped.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.settings.interval.as_secs(),
            window_secs = self.settings.window.as_secs(),
            "Rate limit janitor starting"
        );

        let Some(start) = Instant::now().checked_add(self.settings.interval) else {
            tracing::warn!("Sweep interval out of range, janitor idle until shutdown");
            let _ = shutdown.recv().await;
            return;
        };
        let mut ticker = time::interval_at(start, self.settings.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rate limit janitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn sweep(&self) {
        let evicted = self.registry.sweep(self.settings.window);
        let remaining = self.registry.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining, "Evicted idle clients");
        }
        metrics::record_sweep(evicted, remaining);
    }
}

/// Spawn a [`Janitor`] on the current runtime.
pub fn spawn_janitor(
    registry: Arc<ClientRegistry>,
    settings: JanitorSettings,
    shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    let janitor = Janitor::new(registry, settings);
    tokio::spawn(janitor.run(shutdown))
}
