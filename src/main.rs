//! Personal website server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ TCP listener ──▶ axum middleware ──▶ dispatch
//!                                (request id, trace,   │
//!                                 timeout, limits)     ▼
//!                                              RouteTable::resolve
//!                                                │           │
//!                                            match         no match
//!                                                ▼           ▼
//!                                         page view    301 slash redirect
//!                                                      or 404 page
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;

use personal_website::config::ConfigWatcher;
use personal_website::http::HttpServer;
use personal_website::lifecycle::{signals, startup, Shutdown};
use personal_website::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "personal-website")]
#[command(about = "Serve a two-page personal website", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate configuration and routes, print the route table, and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Configuration is loaded before logging so the configured level applies.
    let config = startup::load_configuration(cli.config.as_deref())?;
    logging::init(&config.observability);

    tracing::info!("personal-website v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let urls = match startup::load_routes() {
        Ok(urls) => urls,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    if cli.check {
        for (index, route) in urls.iter().enumerate() {
            println!(
                "{index}\t{}\t{}\t{}",
                route.pattern().to_url(),
                route.view().name(),
                route.name().unwrap_or("-"),
            );
        }
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = startup::bind(&config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Keep the watcher alive for the life of the server.
    let (config_updates, _watcher) = match cli.config.as_deref() {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (updates, Some(handle)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    (updates, None)
                }
            }
        }
        None => (mpsc::unbounded_channel().1, None),
    };

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, urls);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
