//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatcher as its only handler
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener
//! - Stop accepting on shutdown signal and drain in-flight requests

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::dispatch::{dispatch_handler, Dispatcher};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::ShutdownSignal;
use crate::observability::tracing::make_request_span;

/// HTTP server for the route registry.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Create a new HTTP server around a frozen dispatcher.
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        let dispatcher = Arc::new(dispatcher);
        let router = Self::build_router(&config, dispatcher.clone());
        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, dispatcher: Arc<Dispatcher>) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(dispatcher)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(
                        TraceLayer::new_for_http()
                            .make_span_with(|req: &Request| make_request_span(req)),
                    )
                    .layer(propagate_request_id_layer())
                    // Timeout must sit inside the body limit: it needs a
                    // `Default` response body.
                    .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.dispatcher.registry().route_count(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
