//! Shared utilities for integration testing.

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use route_registry::config::ServerConfig;
use route_registry::http::{ApiError, HttpServer, RequestContext};
use route_registry::lifecycle::build_dispatcher;
use route_registry::routing::{HttpMethod, RouteDefinition};
use route_registry::schema::Schema;

async fn echo(ctx: RequestContext) -> Result<Value, ApiError> {
    Ok(json!({
        "route": ctx.route.to_string(),
        "params": ctx.params,
        "query": ctx.query,
        "body": ctx.body,
    }))
}

/// Server with the built-in routes plus a small host API.
#[allow(dead_code)]
pub fn test_server(config: ServerConfig) -> HttpServer {
    let dispatcher = build_dispatcher(&config, |b| {
        b.route(
            RouteDefinition::new(
                HttpMethod::Get,
                "/api/v1/visualize/:sessionId",
                "Render a stored session",
                Schema::object(),
            )
            .with_tags(["visualization"])
            .with_error(404, Schema::object().property("code", Schema::string(), true)),
            echo,
        )?
        .route(
            RouteDefinition::new(HttpMethod::Get, "/api/v1/tools", "List tools", Schema::object())
                .with_tags(["tools"]),
            echo,
        )?
        .route(
            RouteDefinition::new(
                HttpMethod::Post,
                "/api/v1/tools/:toolName",
                "Invoke a tool",
                Schema::object(),
            )
            .with_tags(["tools"])
            .with_body(
                Schema::object()
                    .property("intent", Schema::string().min_length(1), true)
                    .property("limit", Schema::integer().minimum(1.0), false),
            ),
            echo,
        )?
        .route(
            RouteDefinition::new(HttpMethod::Get, "/api/v1/items/:id", "Get item", Schema::object())
                .with_tags(["items"]),
            echo,
        )?
        .route(
            RouteDefinition::new(
                HttpMethod::Get,
                "/api/v1/items/special",
                "Shadowed by the parameter route",
                Schema::object(),
            )
            .with_tags(["items"]),
            echo,
        )?
        .route(
            RouteDefinition::new(HttpMethod::Get, "/api/v1/test.json", "Dotted literal", Schema::object()),
            echo,
        )?;
        Ok(())
    })
    .expect("test routes register");
    HttpServer::new(config, dispatcher)
}

/// Send one request through the fully layered router.
#[allow(dead_code)]
pub async fn send(router: Router, method: &str, uri: &str, body: &str) -> (StatusCode, HeaderMap, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, value)
}
