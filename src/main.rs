//! middleware-kit server binary.
//!
//! Loads the TOML config, installs logging and metrics, picks the cache
//! backend and serves the middleware pipeline with the demo routes mounted.

use std::path::PathBuf;
use std::time::Duration;

use axum::{http::StatusCode, middleware::from_fn_with_state};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use middleware_kit::cache;
use middleware_kit::config::{load_config, validate_config, AppConfig, CacheBackend, ConfigError};
use middleware_kit::http::demo::{demo_routes, DemoTable, DEMO_NOT_FOUND};
use middleware_kit::http::middleware::{etag_middleware, revoke_token};
use middleware_kit::observability::{init_logging, init_metrics};
use middleware_kit::HttpServer;

#[derive(Parser)]
#[command(name = "middleware-kit")]
#[command(about = "HTTP middleware pipeline with a DataTables grid adapter", long_about = None)]
struct Cli {
    /// TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Force read only mode on.
    #[arg(long)]
    read_only: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the pipeline (default)
    Serve,
    /// Validate the config and exit
    Check,
    /// Blacklist a bearer token in the configured cache
    Revoke {
        token: String,

        /// Expire the revocation after this many seconds
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if cli.read_only {
        config.read_only.enabled = true;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "middleware-kit starting");

    match &cli.command {
        Some(Commands::Check) => {
            tracing::info!("Configuration is valid");
            return Ok(());
        }
        Some(Commands::Revoke { token, ttl_secs }) => {
            if config.cache.backend == CacheBackend::Memory {
                tracing::warn!("Memory cache selected, the revocation ends with this process");
            }
            let cache = cache::from_config(&config.cache).await?;
            let ttl = ttl_secs.map(Duration::from_secs);
            revoke_token(cache.as_ref(), &config.token_blacklist.cache_key_format, token, ttl).await?;
            tracing::info!(ttl_secs = ?ttl_secs, "Token revoked");
            return Ok(());
        }
        Some(Commands::Serve) | None => {}
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        cache_backend = ?config.cache.backend,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let cache = cache::from_config(&config.cache).await?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = HttpServer::new(config, cache)?
        .with_host_version(env!("CARGO_PKG_VERSION"))?
        .with_code_map(|code: i32| match code {
            DEMO_NOT_FOUND => Some(StatusCode::NOT_FOUND),
            _ => None,
        });
    let demo = demo_routes(DemoTable::seeded())
        .route_layer(from_fn_with_state(server.etag_options(), etag_middleware));

    server.with_routes(demo).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
