//! Route storage, lookup and introspection.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Reject duplicate `(method, path template)` registrations
//! - Resolve `(method, path)` to the first matching route plus captured params
//! - Answer schema and tag queries for documentation
//!
//! # Design Decisions
//! - Mutation needs `&mut self`; once shared behind `Arc` it is read-only
//!   and lookups need no locks
//! - O(n) scan per lookup, restricted to the request method
//! - First registered wins when templates overlap (`/items/:id` registered
//!   before `/items/special` captures `special` as `id`)
//! - No match is `None`, never an error
//! - Params, query and body schemas are compiled once, at registration

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::observability::metrics;
use crate::routing::method::HttpMethod;
use crate::routing::pattern::{PathParams, PathPattern, PatternError};
use crate::routing::route::RouteDefinition;
use crate::schema::{CompiledSchema, Schema, SchemaError};

/// Canonical identity of a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: HttpMethod,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A second registration for an existing `(method, path template)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Route already registered: {method} {path}")]
pub struct DuplicateRouteError {
    pub method: HttpMethod,
    pub path: String,
}

/// Why `register` refused a definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Duplicate(#[from] DuplicateRouteError),

    #[error("Invalid route {method} {path}: {source}")]
    Pattern {
        method: HttpMethod,
        path: String,
        #[source]
        source: PatternError,
    },

    #[error("Invalid {part} schema for {method} {path}: {source}")]
    Schema {
        method: HttpMethod,
        path: String,
        part: &'static str,
        #[source]
        source: SchemaError,
    },
}

/// Validators for the request inputs of one route.
#[derive(Debug, Clone, Default)]
pub struct RouteValidators {
    pub params: Option<CompiledSchema>,
    pub query: Option<CompiledSchema>,
    pub body: Option<CompiledSchema>,
}

impl RouteValidators {
    fn compile(definition: &RouteDefinition) -> Result<Self, RegistrationError> {
        let compile = |part: &'static str, schema: Option<&Schema>| {
            schema
                .map(Schema::compile)
                .transpose()
                .map_err(|source| RegistrationError::Schema {
                    method: definition.method,
                    path: definition.path.clone(),
                    part,
                    source,
                })
        };
        Ok(Self {
            params: compile("params", definition.params_schema.as_ref())?,
            query: compile("query", definition.query_schema.as_ref())?,
            body: compile("body", definition.body_schema.as_ref())?,
        })
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteDefinition,
    pub params: PathParams,
    pub validators: &'a RouteValidators,
}

/// Aggregate counts for status endpoints and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_routes: usize,
    pub tags: Vec<String>,
    /// Always has an entry for every [`HttpMethod`].
    pub routes_by_method: BTreeMap<HttpMethod, usize>,
}

#[derive(Debug)]
struct CompiledRoute {
    definition: RouteDefinition,
    pattern: PathPattern,
    validators: RouteValidators,
}

/// The set of declared endpoints.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<CompiledRoute>,
    index: HashMap<RouteKey, usize>,
    tags: BTreeSet<String>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. Fails without touching state if the key is taken, the
    /// template does not compile, or a request schema is malformed.
    pub fn register(&mut self, definition: RouteDefinition) -> Result<(), RegistrationError> {
        let key = RouteKey::new(definition.method, definition.path.clone());

        if self.index.contains_key(&key) {
            tracing::error!(route = %key, "Duplicate route registration");
            return Err(DuplicateRouteError {
                method: key.method,
                path: key.path,
            }
            .into());
        }

        let pattern = PathPattern::compile(&definition.path).map_err(|source| {
            RegistrationError::Pattern {
                method: definition.method,
                path: definition.path.clone(),
                source,
            }
        })?;
        let validators = RouteValidators::compile(&definition)?;

        tracing::debug!(
            route = %key,
            tags = ?definition.tags,
            "Route registered"
        );

        self.tags.extend(definition.tags.iter().cloned());
        self.index.insert(key, self.routes.len());
        self.routes.push(CompiledRoute {
            definition,
            pattern,
            validators,
        });
        metrics::record_route_count(self.routes.len());
        Ok(())
    }

    /// Resolve a request. `method` is matched case-insensitively; unknown
    /// methods never match.
    pub fn find_route(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        let method = method.parse::<HttpMethod>().ok()?;
        self.find_route_by_method(method, path)
    }

    /// First route of `method`, in registration order, whose template matches `path`.
    pub fn find_route_by_method(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|r| r.definition.method == method)
            .find_map(|r| {
                r.pattern.match_path(path).map(|params| RouteMatch {
                    route: &r.definition,
                    params,
                    validators: &r.validators,
                })
            })
    }

    /// Methods with at least one template matching `path`.
    pub fn allowed_methods(&self, path: &str) -> Vec<HttpMethod> {
        HttpMethod::ALL
            .into_iter()
            .filter(|m| {
                self.routes
                    .iter()
                    .any(|r| r.definition.method == *m && r.pattern.is_match(path))
            })
            .collect()
    }

    /// Exact key check, no pattern matching.
    pub fn has_route(&self, method: &str, path_template: &str) -> bool {
        self.get(method, path_template).is_some()
    }

    /// Exact key lookup.
    pub fn get(&self, method: &str, path_template: &str) -> Option<&RouteDefinition> {
        let method = method.parse::<HttpMethod>().ok()?;
        self.index
            .get(&RouteKey::new(method, path_template))
            .map(|&i| &self.routes[i].definition)
    }

    /// Compiled template for a registered route.
    pub fn pattern(&self, method: HttpMethod, path_template: &str) -> Option<&PathPattern> {
        self.index
            .get(&RouteKey::new(method, path_template))
            .map(|&i| &self.routes[i].pattern)
    }

    /// Owned snapshot of every route in registration order.
    pub fn all_routes(&self) -> Vec<RouteDefinition> {
        self.routes.iter().map(|r| r.definition.clone()).collect()
    }

    /// Routes carrying `tag`; empty for unknown tags.
    pub fn routes_by_tag(&self, tag: &str) -> Vec<RouteDefinition> {
        self.routes
            .iter()
            .filter(|r| r.definition.has_tag(tag))
            .map(|r| r.definition.clone())
            .collect()
    }

    /// Union of all tags, sorted and de-duplicated.
    pub fn tags(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    pub fn response_schema(&self, method: &str, path_template: &str) -> Option<&Schema> {
        self.get(method, path_template).map(|r| &r.response_schema)
    }

    pub fn error_response_schema(
        &self,
        method: &str,
        path_template: &str,
        status: u16,
    ) -> Option<&Schema> {
        self.get(method, path_template)
            .and_then(|r| r.error_response_schemas.get(&status))
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut routes_by_method: BTreeMap<HttpMethod, usize> =
            HttpMethod::ALL.into_iter().map(|m| (m, 0)).collect();
        for route in &self.routes {
            *routes_by_method.entry(route.definition.method).or_default() += 1;
        }
        RegistryStats {
            total_routes: self.routes.len(),
            tags: self.tags(),
            routes_by_method,
        }
    }

    /// Drop every route. Meant for test isolation.
    pub fn clear(&mut self) {
        self.routes.clear();
        self.index.clear();
        self.tags.clear();
        metrics::record_route_count(0);
    }
}
