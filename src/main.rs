//! Route registry API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!                      │ http server  │───▶│  dispatcher  │───▶│   registry   │
//!                      │ (middleware) │    │ (validation) │    │ (find_route) │
//!                      └──────────────┘    └──────┬───────┘    └──────────────┘
//!                                                 │
//!                                                 ▼
//!     Client Response                      ┌──────────────┐
//!     ◀─────────────────────────────────── │   handler    │
//!                                          └──────────────┘
//! ```
//!
//! Configuration is read from the TOML file named by `ROUTE_REGISTRY_CONFIG`
//! (defaults otherwise). A route registration failure exits non-zero before
//! the listener is bound.

use tokio::net::TcpListener;

use route_registry::config::load_from_env;
use route_registry::http::HttpServer;
use route_registry::lifecycle::{build_dispatcher, signals, Shutdown};
use route_registry::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_from_env()?;

    logging::init(&config.observability);

    tracing::info!("route-registry v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_bytes = config.limits.max_body_bytes,
        "Configuration loaded"
    );

    // The recorder has to exist before registration sets `routes_registered`.
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let dispatcher = build_dispatcher(&config, |_| Ok(())).inspect_err(|e| {
        tracing::error!(error = %e, "Aborting startup");
    })?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, dispatcher);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
