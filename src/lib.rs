//! Typed route registry and request dispatcher.
//!
//! Declare endpoints once at startup (method, path template, schemas,
//! metadata), resolve `(method, path)` pairs to them at request time, and
//! generate an OpenAPI document from what was declared.
//!
//! ```
//! use route_registry::routing::{HttpMethod, RouteDefinition, RouteRegistry};
//! use route_registry::schema::Schema;
//!
//! let mut registry = RouteRegistry::new();
//! registry
//!     .register(
//!         RouteDefinition::new(HttpMethod::Get, "/api/v1/items/:id", "Fetch an item", Schema::object())
//!             .with_tags(["items"]),
//!     )
//!     .unwrap();
//!
//! let found = registry.find_route("get", "/api/v1/items/42").unwrap();
//! assert_eq!(found.params["id"], "42");
//! assert!(registry.find_route("GET", "/api/v1/items/42/extra").is_none());
//! ```

pub mod api;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod openapi;
pub mod routing;
pub mod schema;

pub use config::ServerConfig;
pub use http::{Dispatcher, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::{HttpMethod, RouteDefinition, RouteRegistry};
pub use schema::Schema;
