//! OpenAPI document generation.
//!
//! # Responsibilities
//! - Walk every registered route and emit an OpenAPI 3.0.3 document
//! - Translate `:name` templates into `{name}` paths
//! - Surface params, query, body, success and error schemas
//!
//! # Design Decisions
//! - Reads the registry only through its public accessors
//! - Output is deterministic for a given registered set (sorted maps)
//! - Colliding operation ids get a numeric suffix in registration order

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::config::DocsConfig;
use crate::routing::{PathPattern, RouteDefinition, RouteRegistry};
use crate::schema::Schema;

pub const OPENAPI_VERSION: &str = "3.0.3";

/// Build the API description for everything in `registry`.
pub fn generate(registry: &RouteRegistry, info: &DocsConfig) -> Value {
    let mut paths = Map::new();
    let mut used_ids = HashSet::new();

    for route in registry.all_routes() {
        let Some(pattern) = registry.pattern(route.method, &route.path) else {
            continue;
        };
        let item = paths
            .entry(pattern.openapi_path())
            .or_insert_with(|| Value::Object(Map::new()));
        let id = unique_id(operation_id(&route), &mut used_ids);
        if let Value::Object(item) = item {
            item.insert(route.method.as_lower().to_string(), operation(&route, pattern, id));
        }
    }

    let tags: Vec<Value> = registry
        .tags()
        .into_iter()
        .map(|name| json!({ "name": name }))
        .collect();

    json!({
        "openapi": OPENAPI_VERSION,
        "info": {
            "title": info.title,
            "version": info.version,
            "description": info.description,
        },
        "tags": tags,
        "paths": paths,
    })
}

fn operation(route: &RouteDefinition, pattern: &PathPattern, id: String) -> Value {
    let mut op = Map::new();
    op.insert("summary".into(), Value::String(summary(&route.description)));
    op.insert("description".into(), Value::String(route.description.clone()));
    op.insert("operationId".into(), Value::String(id));
    if !route.tags.is_empty() {
        op.insert("tags".into(), json!(route.tags));
    }

    let mut parameters = Vec::new();
    for name in pattern.param_names() {
        let declared = route
            .params_schema
            .as_ref()
            .and_then(|s| s.properties().find(|(n, _)| *n == name).map(|(_, s)| s));
        parameters.push(parameter(name, "path", true, declared));
    }
    if let Some(query) = &route.query_schema {
        for (name, schema) in query.properties() {
            parameters.push(parameter(name, "query", query.is_required(name), Some(schema)));
        }
    }
    if !parameters.is_empty() {
        op.insert("parameters".into(), Value::Array(parameters));
    }

    if let Some(body) = &route.body_schema {
        op.insert(
            "requestBody".into(),
            json!({
                "required": true,
                "content": { "application/json": { "schema": body.as_json() } }
            }),
        );
    }

    let mut responses = Map::new();
    responses.insert(
        "200".into(),
        response("Successful response", &route.response_schema),
    );
    for (status, schema) in &route.error_response_schemas {
        responses.insert(status.to_string(), response("Error response", schema));
    }
    op.insert("responses".into(), Value::Object(responses));

    Value::Object(op)
}

fn parameter(name: &str, location: &str, required: bool, schema: Option<Schema>) -> Value {
    let schema = schema.unwrap_or_else(Schema::string);
    let mut param = json!({
        "name": name,
        "in": location,
        "required": required,
        "schema": schema.as_json(),
    });
    if let Some(desc) = schema.as_json().get("description") {
        param["description"] = desc.clone();
    }
    param
}

fn response(description: &str, schema: &Schema) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema.as_json() } }
    })
}

/// First line of the description.
fn summary(description: &str) -> String {
    description.lines().next().unwrap_or_default().trim().to_string()
}

/// `GET /api/v1/items/:id` → `get_api_v1_items_id`.
fn operation_id(route: &RouteDefinition) -> String {
    let mut id = route.method.as_lower().to_string();
    for segment in route.path.split('/').filter(|s| !s.is_empty()) {
        id.push('_');
        id.extend(
            segment
                .trim_start_matches(':')
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }),
        );
    }
    id
}

/// `base`, or `base_2`, `base_3`... when already taken.
fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
