//! End-to-end dispatch through the layered axum router.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use route_registry::config::ServerConfig;
use route_registry::http::{ApiError, HttpServer, RequestContext};
use route_registry::lifecycle::build_dispatcher;
use route_registry::routing::{HttpMethod, RouteDefinition};
use route_registry::schema::Schema;

mod common;

fn router() -> axum::Router {
    common::test_server(ServerConfig::default()).router()
}

#[tokio::test]
async fn test_param_capture_preserves_special_characters() {
    let (status, _, body) = common::send(router(), "GET", "/api/v1/visualize/a+b", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["params"], json!({"sessionId": "a+b"}));
}

#[tokio::test]
async fn test_extra_segment_is_not_found() {
    let (status, _, body) = common::send(router(), "GET", "/api/v1/visualize/abc/extra", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_trailing_slash_is_not_found() {
    let (status, _, _) = common::send(router(), "GET", "/api/v1/tools/", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registration_order_breaks_ties() {
    let (status, _, body) = common::send(router(), "GET", "/api/v1/items/special", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["route"], "GET /api/v1/items/:id");
    assert_eq!(body["data"]["params"], json!({"id": "special"}));
}

#[tokio::test]
async fn test_dot_matches_literally() {
    let (status, _, _) = common::send(router(), "GET", "/api/v1/test.json", "").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = common::send(router(), "GET", "/api/v1/testXjson", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method_gets_allow_header() {
    let (status, headers, _) = common::send(router(), "DELETE", "/api/v1/tools", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers["allow"], "GET");
}

#[tokio::test]
async fn test_body_validated_against_schema() {
    let (status, _, body) = common::send(
        router(),
        "POST",
        "/api/v1/tools/recommend",
        r#"{"intent": "deploy a database", "limit": 3}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["params"]["toolName"], "recommend");
    assert_eq!(body["data"]["body"]["limit"], 3);

    let (status, _, body) =
        common::send(router(), "POST", "/api/v1/tools/recommend", r#"{"limit": 0}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let mut paths: Vec<&str> = body["error"]["details"]["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["path"].as_str().unwrap())
        .collect();
    paths.sort();
    // The missing `intent` is reported against the body object itself.
    assert_eq!(paths, vec!["/body", "/body/limit"]);
}

#[tokio::test]
async fn test_request_id_generated_and_echoed() {
    let (_, headers, body) = common::send(router(), "GET", "/healthz", "").await;
    let id = headers["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(id.len(), 36);
    assert_eq!(body["meta"]["requestId"], id);
    assert_eq!(body["data"], json!({"status": "ok"}));
}

#[tokio::test]
async fn test_oversized_body_rejected_by_limit_layer() {
    let mut config = ServerConfig::default();
    config.limits.max_body_bytes = 16;
    let router = common::test_server(config).router();
    let (status, _, _) = common::send(
        router,
        "POST",
        "/api/v1/tools/recommend",
        r#"{"intent": "this body is far too long"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_slow_handler_times_out_inside_body_limit() {
    let mut config = ServerConfig::default();
    config.timeouts.request_secs = 1;
    config.limits.max_body_bytes = 1024;
    let dispatcher = build_dispatcher(&config, |b| {
        b.route(
            RouteDefinition::new(HttpMethod::Get, "/api/v1/slow", "Sleeps", Schema::any()),
            |_ctx: RequestContext| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ApiError>(json!({}))
            },
        )?;
        Ok(())
    })
    .unwrap();
    let router = HttpServer::new(config, dispatcher).router();

    let (status, headers, _) = common::send(router.clone(), "GET", "/api/v1/slow", "").await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert!(headers.contains_key("x-request-id"));

    // Fast routes behind the same stack are unaffected.
    let (status, _, _) = common::send(router, "GET", "/healthz", "").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_lists_host_routes() {
    let (status, _, body) = common::send(router(), "GET", "/api/v1/openapi", "").await;
    assert_eq!(status, StatusCode::OK);
    let doc = &body["data"];
    assert_eq!(doc["openapi"], "3.0.3");
    assert!(doc["paths"]["/api/v1/visualize/{sessionId}"]["get"].is_object());
    assert!(doc["paths"]["/api/v1/tools/{toolName}"]["post"]["requestBody"].is_object());
    assert!(doc["paths"]["/api/v1/visualize/{sessionId}"]["get"]["responses"]["404"].is_object());
    assert!(doc["paths"]["/api/v1/openapi"]["get"].is_object());
}

#[tokio::test]
async fn test_route_listing_and_tag_filter() {
    let (_, _, body) = common::send(router(), "GET", "/api/v1/routes?tag=tools", "").await;
    assert_eq!(body["data"]["total"], 2);
    let paths: Vec<&str> = body["data"]["routes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["/api/v1/tools", "/api/v1/tools/:toolName"]);

    let (_, _, body) = common::send(router(), "GET", "/api/v1/routes?tag=unknown", "").await;
    assert_eq!(body["data"]["total"], 0);

    let (status, _, _) = common::send(router(), "GET", "/api/v1/routes?bogus=1", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_and_tags() {
    let (_, _, body) = common::send(router(), "GET", "/api/v1/routes/stats", "").await;
    let stats = &body["data"];
    assert_eq!(stats["totalRoutes"], 11);
    assert_eq!(
        stats["routesByMethod"],
        json!({"GET": 10, "POST": 1, "PUT": 0, "DELETE": 0})
    );

    let (_, _, body) = common::send(router(), "GET", "/api/v1/tags", "").await;
    assert_eq!(
        body["data"]["tags"],
        json!(["documentation", "items", "system", "tools", "visualization"])
    );
}
