//! Request dispatch through the route registry.
//!
//! # Responsibilities
//! - Resolve `(method, path)` with the registry
//! - Coerce and validate params, query and body against the route's schemas
//! - Invoke the bound handler and wrap its result
//!
//! # Data Flow
//! ```text
//! Request
//!     → registry.find_route_by_method (None → 405 if another method fits, else 404)
//!     → params / query / body validation (→ 400 with every violation)
//!     → handler(RequestContext)
//!     → success / failure envelope
//! ```
//!
//! # Design Decisions
//! - Handlers are bound by `RouteKey` at startup, never at request time
//! - A declared route without a handler answers 501 rather than 404

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::{Query, State};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::http::request::request_id;
use crate::http::response::{self, ApiError, Meta};
use crate::observability::metrics;
use crate::routing::{
    HttpMethod, PathParams, RegistrationError, RouteDefinition, RouteKey, RouteMatch,
    RouteRegistry, RouteValidators,
};
use crate::schema::{CompiledSchema, Schema, SchemaViolation};

/// Default cap on request bodies read by the dispatcher.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Boxed future returned by handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, ApiError>> + Send>>;

/// Endpoint logic invoked once a route is resolved and validated.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
{
    fn call(&self, ctx: RequestContext) -> HandlerFuture {
        Box::pin(self(ctx))
    }
}

/// Everything a handler sees about the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    /// The matched route.
    pub route: RouteKey,
    /// Path parameters, typed per the params schema.
    pub params: Value,
    /// Query parameters, typed per the query schema.
    pub query: Value,
    /// Parsed JSON body, `Null` when empty.
    pub body: Value,
    pub registry: Arc<RouteRegistry>,
}

/// Collects routes and handlers during startup.
pub struct DispatcherBuilder {
    registry: RouteRegistry,
    handlers: HashMap<RouteKey, Arc<dyn Handler>>,
    body_limit: usize,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            registry: RouteRegistry::new(),
            handlers: HashMap::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Register `definition` and bind `handler` to it.
    pub fn route<H: Handler>(
        &mut self,
        definition: RouteDefinition,
        handler: H,
    ) -> Result<&mut Self, RegistrationError> {
        let key = RouteKey::new(definition.method, definition.path.clone());
        self.registry.register(definition)?;
        self.handlers.insert(key, Arc::new(handler));
        Ok(self)
    }

    /// Register a documented route with no handler yet; requests get 501.
    pub fn declare(&mut self, definition: RouteDefinition) -> Result<&mut Self, RegistrationError> {
        self.registry.register(definition)?;
        Ok(self)
    }

    /// Maximum body size read per request.
    pub fn body_limit(&mut self, bytes: usize) -> &mut Self {
        self.body_limit = bytes;
        self
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Freeze the registry.
    pub fn build(self) -> Dispatcher {
        tracing::info!(
            routes = self.registry.route_count(),
            handlers = self.handlers.len(),
            "Route registry frozen"
        );
        Dispatcher {
            registry: Arc::new(self.registry),
            handlers: self.handlers,
            body_limit: self.body_limit,
        }
    }
}

/// Immutable, shareable request dispatcher.
pub struct Dispatcher {
    registry: Arc<RouteRegistry>,
    handlers: HashMap<RouteKey, Arc<dyn Handler>>,
    body_limit: usize,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    /// Handle one request end to end.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let meta = Meta::new(
            request_id(&request)
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        );
        let method_str = request.method().as_str().to_string();
        let path = request.uri().path().to_string();

        let matched = HttpMethod::try_from(request.method())
            .ok()
            .and_then(|m| self.registry.find_route_by_method(m, &path));

        let Some(RouteMatch {
            route,
            params,
            validators,
        }) = matched
        else {
            return self.unmatched(&method_str, &path, &meta, start);
        };

        let key = RouteKey::new(route.method, route.path.clone());
        let outcome = match self.prepare(route, validators, params, request, &meta).await {
            Ok(ctx) => match self.handlers.get(&key) {
                Some(handler) => handler.call(ctx).await,
                None => Err(ApiError::new(
                    StatusCode::NOT_IMPLEMENTED,
                    "NOT_IMPLEMENTED",
                    format!("No handler bound for {}", key),
                )),
            },
            Err(err) => Err(err),
        };

        let response = match outcome {
            Ok(data) => response::success(data, &meta),
            Err(err) => {
                if err.status.is_server_error() {
                    tracing::error!(route = %key, code = %err.code, error = %err.message, "Handler failed");
                } else {
                    tracing::warn!(route = %key, code = %err.code, error = %err.message, "Request rejected");
                }
                response::failure(&err, &meta)
            }
        };

        tracing::debug!(
            route = %key,
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request dispatched"
        );
        metrics::record_request(&method_str, &route.path, response.status().as_u16(), start);
        response
    }

    fn unmatched(&self, method: &str, path: &str, meta: &Meta, start: Instant) -> Response {
        let allowed = self.registry.allowed_methods(path);
        let response = if allowed.is_empty() {
            tracing::debug!(method = %method, path = %path, "No route matched");
            let err = ApiError::not_found(format!("No route for {} {}", method, path));
            response::failure(&err, meta)
        } else {
            tracing::debug!(method = %method, path = %path, allowed = ?allowed, "Method not allowed");
            let err = ApiError::method_not_allowed(method, path);
            response::method_not_allowed(&err, &allowed, meta)
        };
        metrics::record_request(method, "none", response.status().as_u16(), start);
        response
    }

    /// Build the handler context, validating every input against its schema.
    async fn prepare(
        &self,
        route: &RouteDefinition,
        validators: &RouteValidators,
        params: PathParams,
        request: Request<Body>,
        meta: &Meta,
    ) -> Result<RequestContext, ApiError> {
        let (parts, body) = request.into_parts();
        let mut violations = Vec::new();

        let params = typed(
            route.params_schema.as_ref(),
            validators.params.as_ref(),
            &params,
            "/params",
            &mut violations,
        );

        let raw_query: BTreeMap<String, String> = Query::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .map_err(|e| ApiError::bad_request("INVALID_QUERY", e.body_text()))?;
        let query = typed(
            route.query_schema.as_ref(),
            validators.query.as_ref(),
            &raw_query,
            "/query",
            &mut violations,
        );

        let bytes = to_bytes(body, self.body_limit).await.map_err(|_| {
            ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                format!("Request body exceeds {} bytes", self.body_limit),
            )
        })?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::bad_request("INVALID_JSON", e.to_string()))?
        };
        if let Some(validator) = &validators.body {
            collect(validator.validate(&body), "/body", &mut violations);
        }

        if !violations.is_empty() {
            return Err(ApiError::validation(violations));
        }

        Ok(RequestContext {
            request_id: meta.request_id.clone(),
            route: RouteKey::new(route.method, route.path.clone()),
            params,
            query,
            body,
            registry: self.registry.clone(),
        })
    }
}

/// Coerce transport strings with `schema` (if any) and validate them.
fn typed(
    schema: Option<&Schema>,
    validator: Option<&CompiledSchema>,
    raw: &BTreeMap<String, String>,
    prefix: &str,
    violations: &mut Vec<SchemaViolation>,
) -> Value {
    match (schema, validator) {
        (Some(schema), Some(validator)) => {
            let value = schema.coerce_strings(raw);
            collect(validator.validate(&value), prefix, violations);
            value
        }
        _ => Value::Object(
            raw.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect::<Map<String, Value>>(),
        ),
    }
}

fn collect(
    result: Result<(), Vec<SchemaViolation>>,
    prefix: &str,
    violations: &mut Vec<SchemaViolation>,
) {
    if let Err(found) = result {
        violations.extend(found.into_iter().map(|v| v.under(prefix)));
    }
}

/// Axum entry point; mounted as the router fallback.
pub async fn dispatch_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request<Body>,
) -> Response {
    dispatcher.dispatch(request).await
}
