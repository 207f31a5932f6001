//! Startup orchestration.
//!
//! # Responsibilities
//! - Register every route the process serves
//! - Freeze the registry into a dispatcher
//!
//! # Design Decisions
//! - Fail fast: a duplicate or malformed route is fatal
//! - Extra host routes are registered through a caller-supplied hook

use thiserror::Error;

use crate::api::register_builtin_routes;
use crate::config::ServerConfig;
use crate::http::dispatch::{Dispatcher, DispatcherBuilder};
use crate::routing::RegistrationError;

/// Errors that abort boot.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Route registration failed: {0}")]
    Registration(#[from] RegistrationError),
}

/// Build the dispatcher with the built-in routes plus whatever `register`
/// adds.
pub fn build_dispatcher<F>(config: &ServerConfig, register: F) -> Result<Dispatcher, StartupError>
where
    F: FnOnce(&mut DispatcherBuilder) -> Result<(), RegistrationError>,
{
    let mut builder = Dispatcher::builder();
    builder.body_limit(config.limits.max_body_bytes);

    register_builtin_routes(&mut builder, config.docs.clone())?;
    register(&mut builder)?;

    let stats = builder.registry().stats();
    tracing::info!(
        total_routes = stats.total_routes,
        tags = ?stats.tags,
        "Routes registered"
    );
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{HttpMethod, RouteDefinition};
    use crate::schema::Schema;

    #[test]
    fn test_builtin_routes_registered() {
        let dispatcher = build_dispatcher(&ServerConfig::default(), |_| Ok(())).unwrap();
        let registry = dispatcher.registry();
        assert!(registry.has_route("GET", "/healthz"));
        assert!(registry.has_route("GET", "/api/v1/openapi"));
        assert!(registry.has_route("GET", "/api/v1/routes"));
        assert!(registry.has_route("GET", "/api/v1/routes/stats"));
        assert!(registry.has_route("GET", "/api/v1/tags"));
        assert_eq!(registry.tags(), vec!["documentation", "system"]);
    }

    #[test]
    fn test_host_duplicate_aborts() {
        let err = build_dispatcher(&ServerConfig::default(), |b| {
            b.declare(RouteDefinition::new(HttpMethod::Get, "/healthz", "again", Schema::any()))?;
            Ok(())
        })
        .err()
        .unwrap();
        assert_eq!(
            err.to_string(),
            "Route registration failed: Route already registered: GET /healthz"
        );
    }
}
