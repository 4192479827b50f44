//! forum-guard: the forum API behind its request pipeline.
//!
//! ```text
//!   client ──▶ request id ──▶ panic recovery ──▶ CORS ──▶ rate limit ──▶ authenticate
//!                                                                            │
//!   client ◀────────────── response ◀────────── handler ◀──── guards ◀──────┘
//!
//!   background: rate limit janitor (stops on shutdown)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use forum_guard::config::{self, validate_config, ConfigError, GuardConfig};
use forum_guard::lifecycle::signals;
use forum_guard::observability::{logging, metrics};
use forum_guard::store::MemoryStore;
use forum_guard::{routes, Collaborators, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "forum-guard")]
#[command(about = "Forum API with rate limiting, authentication and authorization", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API server port.
    #[arg(long)]
    port: Option<u16>,

    /// Environment (development | staging | production).
    #[arg(long)]
    env: Option<String>,

    /// Rate limiter maximum requests per second.
    #[arg(long)]
    limiter_rps: Option<f64>,

    /// Rate limiter maximum burst.
    #[arg(long)]
    limiter_burst: Option<u32>,

    /// Enable rate limiter.
    #[arg(long)]
    limiter_enabled: Option<bool>,

    /// Trusted CORS origins (space separated).
    #[arg(long)]
    cors_trusted_origins: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<GuardConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => GuardConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn apply(&self, config: &mut GuardConfig) {
        if let Some(port) = self.port {
            match config.listener.bind_address.parse::<SocketAddr>() {
                Ok(mut addr) => {
                    addr.set_port(port);
                    config.listener.bind_address = addr.to_string();
                }
                Err(_) => config.listener.bind_address = format!("0.0.0.0:{port}"),
            }
        }
        if let Some(env) = &self.env {
            config.listener.environment = env.clone();
        }
        if let Some(rps) = self.limiter_rps {
            config.rate_limit.requests_per_second = rps;
        }
        if let Some(burst) = self.limiter_burst {
            config.rate_limit.burst = burst;
        }
        if let Some(enabled) = self.limiter_enabled {
            config.rate_limit.enabled = enabled;
        }
        if let Some(origins) = &self.cors_trusted_origins {
            config.cors.trusted_origins = origins.split_whitespace().map(String::from).collect();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "forum-guard starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = %config.listener.environment,
        rate_limit_enabled = config.rate_limit.enabled,
        requests_per_second = config.rate_limit.requests_per_second,
        burst = config.rate_limit.burst,
        accounts = config.accounts.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let store = Arc::new(MemoryStore::from_accounts(&config.accounts));
    let environment = config.listener.environment.clone();
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = HttpServer::new(config, Collaborators::from_store(store), |guards| {
        routes::routes(guards, &environment)
    });

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        trigger.trigger();
    });

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
