//! Built-in introspection endpoints.
//!
//! These are declared through the same registry as host routes, so they
//! show up in the generated document like any other endpoint.

use serde_json::{json, Value};

use crate::config::DocsConfig;
use crate::http::dispatch::{DispatcherBuilder, RequestContext};
use crate::http::response::ApiError;
use crate::openapi;
use crate::routing::{HttpMethod, RegistrationError, RouteDefinition};
use crate::schema::Schema;

pub const TAG_SYSTEM: &str = "system";
pub const TAG_DOCUMENTATION: &str = "documentation";

fn error_schema() -> Schema {
    Schema::object()
        .property("success", Schema::boolean(), true)
        .property(
            "error",
            Schema::object()
                .property("code", Schema::string(), true)
                .property("message", Schema::string(), true),
            true,
        )
}

/// Register `/healthz`, the OpenAPI document and the route listings.
pub fn register_builtin_routes(
    builder: &mut DispatcherBuilder,
    docs: DocsConfig,
) -> Result<(), RegistrationError> {
    builder.route(
        RouteDefinition::new(
            HttpMethod::Get,
            "/healthz",
            "Liveness probe",
            Schema::object().property("status", Schema::string(), true),
        )
        .with_tags([TAG_SYSTEM]),
        |_ctx: RequestContext| async { Ok::<_, ApiError>(json!({ "status": "ok" })) },
    )?;

    builder.route(
        RouteDefinition::new(
            HttpMethod::Get,
            "/api/v1/openapi",
            "OpenAPI document for every registered route",
            Schema::object().property("openapi", Schema::string(), true),
        )
        .with_tags([TAG_DOCUMENTATION]),
        move |ctx: RequestContext| {
            let doc = openapi::generate(&ctx.registry, &docs);
            async move { Ok::<_, ApiError>(doc) }
        },
    )?;

    builder.route(
        RouteDefinition::new(
            HttpMethod::Get,
            "/api/v1/routes",
            "List registered routes, optionally filtered by tag",
            Schema::object()
                .property("routes", Schema::array(Schema::object()), true)
                .property("total", Schema::integer(), true),
        )
        .with_tags([TAG_DOCUMENTATION])
        .with_query(
            Schema::object()
                .property(
                    "tag",
                    Schema::string()
                        .min_length(1)
                        .description("Only routes carrying this tag"),
                    false,
                )
                .strict(),
        ),
        |ctx: RequestContext| async move { list_routes(&ctx) },
    )?;

    builder.route(
        RouteDefinition::new(
            HttpMethod::Get,
            "/api/v1/routes/stats",
            "Route counts per method and the tag set",
            Schema::object()
                .property("totalRoutes", Schema::integer(), true)
                .property("tags", Schema::array(Schema::string()), true)
                .property("routesByMethod", Schema::object(), true),
        )
        .with_tags([TAG_DOCUMENTATION])
        .with_error(500, error_schema()),
        |ctx: RequestContext| async move {
            serde_json::to_value(ctx.registry.stats()).map_err(|e| ApiError::internal(e.to_string()))
        },
    )?;

    builder.route(
        RouteDefinition::new(
            HttpMethod::Get,
            "/api/v1/tags",
            "Sorted set of tags across all routes",
            Schema::object().property("tags", Schema::array(Schema::string()), true),
        )
        .with_tags([TAG_DOCUMENTATION]),
        |ctx: RequestContext| async move {
            Ok::<_, ApiError>(json!({ "tags": ctx.registry.tags() }))
        },
    )?;

    Ok(())
}

fn list_routes(ctx: &RequestContext) -> Result<Value, ApiError> {
    let routes = match ctx.query.get("tag").and_then(Value::as_str) {
        Some(tag) => ctx.registry.routes_by_tag(tag),
        None => ctx.registry.all_routes(),
    };
    let total = routes.len();
    let routes = serde_json::to_value(routes).map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(json!({ "routes": routes, "total": total }))
}
