//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     RouteDefinition
//!     → registry.rs (duplicate check on (method, template))
//!     → pattern.rs (compile template into segments)
//!     → schema (compile params/query/body validators)
//!     → stored in registration order
//!
//! Incoming Request (method, path)
//!     → registry.rs (filter by method, scan in order)
//!     → pattern.rs (per-segment literal/param check)
//!     → Return: RouteMatch { route, params, validators } or None
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by registration)

pub mod method;
pub mod pattern;
pub mod registry;
pub mod route;

pub use method::HttpMethod;
pub use pattern::{PathParams, PathPattern, PatternError};
pub use registry::{
    DuplicateRouteError, RegistrationError, RegistryStats, RouteKey, RouteMatch, RouteRegistry,
    RouteValidators,
};
pub use route::RouteDefinition;
