//! Structural schemas for route parameters, bodies and responses.
//!
//! # Data Flow
//! ```text
//! RouteDefinition { params, query, body, response, errors }
//!     → validate.rs (compiled once at registration via `jsonschema`)
//!     → openapi (emit Schema::as_json() verbatim)
//! ```
//!
//! # Design Decisions
//! - A schema is a JSON Schema document wrapped in an opaque type
//! - Builders cover the common keywords; any other keyword can be supplied
//!   through [`Schema::new`]
//! - Transport strings (path params, query values) are coerced before validation

mod validate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use validate::{CompiledSchema, SchemaError, SchemaViolation};

/// An opaque structural schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(Value);

impl Schema {
    /// Wrap an existing JSON Schema document.
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// Schema that accepts any value.
    pub fn any() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn object() -> Self {
        Self::typed("object")
    }

    pub fn string() -> Self {
        Self::typed("string")
    }

    pub fn integer() -> Self {
        Self::typed("integer")
    }

    pub fn number() -> Self {
        Self::typed("number")
    }

    pub fn boolean() -> Self {
        Self::typed("boolean")
    }

    pub fn array(items: Schema) -> Self {
        Self::typed("array").with("items", items.0)
    }

    fn typed(ty: &str) -> Self {
        let mut map = Map::new();
        map.insert("type".into(), Value::String(ty.into()));
        Self(Value::Object(map))
    }

    fn with(mut self, key: &str, value: Value) -> Self {
        if let Value::Object(map) = &mut self.0 {
            map.insert(key.to_string(), value);
        }
        self
    }

    /// Add an object property, optionally marking it required.
    pub fn property(mut self, name: &str, schema: Schema, required: bool) -> Self {
        if let Value::Object(map) = &mut self.0 {
            let props = map
                .entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(props) = props {
                props.insert(name.to_string(), schema.0);
            }
            if required {
                let req = map
                    .entry("required")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(req) = req {
                    if !req.iter().any(|v| v.as_str() == Some(name)) {
                        req.push(Value::String(name.to_string()));
                    }
                }
            }
        }
        self
    }

    /// Reject properties not listed in `properties`.
    pub fn strict(self) -> Self {
        self.with("additionalProperties", Value::Bool(false))
    }

    pub fn description(self, text: &str) -> Self {
        self.with("description", Value::String(text.to_string()))
    }

    pub fn enumeration<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(|v| Value::String(v.into())).collect();
        self.with("enum", Value::Array(values))
    }

    pub fn minimum(self, min: f64) -> Self {
        self.with("minimum", Value::from(min))
    }

    pub fn maximum(self, max: f64) -> Self {
        self.with("maximum", Value::from(max))
    }

    pub fn min_length(self, len: u64) -> Self {
        self.with("minLength", Value::from(len))
    }

    pub fn max_length(self, len: u64) -> Self {
        self.with("maxLength", Value::from(len))
    }

    /// Allow `null` in addition to the declared type.
    pub fn nullable(mut self) -> Self {
        if let Value::Object(map) = &mut self.0 {
            match map.get_mut("type") {
                Some(Value::String(ty)) => {
                    let ty = std::mem::take(ty);
                    map.insert(
                        "type".into(),
                        Value::Array(vec![Value::String(ty), Value::String("null".into())]),
                    );
                }
                Some(Value::Array(types)) => {
                    if !types.iter().any(|t| t == "null") {
                        types.push(Value::String("null".into()));
                    }
                }
                _ => {}
            }
        }
        self
    }

    /// The underlying document, for documentation generators.
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Declared properties of an object schema, in name order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, Schema)> + '_ {
        self.0
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|props| props.iter().map(|(k, v)| (k.as_str(), Schema(v.clone()))))
    }

    /// Whether `name` is listed in `required`.
    pub fn is_required(&self, name: &str) -> bool {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .is_some_and(|req| req.iter().any(|v| v.as_str() == Some(name)))
    }

    /// Compile for repeated validation.
    pub fn compile(&self) -> Result<CompiledSchema, SchemaError> {
        CompiledSchema::compile(self)
    }

    /// One-off check of `value`, collecting every violation. Routes use the
    /// copy compiled at registration instead.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<SchemaViolation>> {
        match self.compile() {
            Ok(compiled) => compiled.validate(value),
            Err(err) => Err(vec![SchemaViolation {
                path: String::new(),
                message: err.to_string(),
            }]),
        }
    }

    /// Turn transport-level strings into typed JSON according to declared
    /// property types. Values that do not parse are kept as strings so that
    /// validation reports them.
    pub fn coerce_strings(&self, raw: &BTreeMap<String, String>) -> Value {
        let props = self.0.get("properties").and_then(Value::as_object);
        let mut out = Map::new();
        for (name, text) in raw {
            let declared = props.and_then(|p| p.get(name));
            out.insert(name.clone(), coerce(declared, text));
        }
        Value::Object(out)
    }
}

/// Types listed under `type`, empty when unconstrained.
fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(ty)) => vec![ty.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn coerce(declared: Option<&Value>, text: &str) -> Value {
    let types = declared.map(declared_types).unwrap_or_default();
    for ty in types {
        let parsed = match ty {
            "integer" => text.parse::<i64>().ok().map(Value::from),
            "number" => text
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Value::from),
            "boolean" => match text {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        };
        if let Some(v) = parsed {
            return v;
        }
    }
    Value::String(text.to_string())
}

impl From<Value> for Schema {
    fn from(document: Value) -> Self {
        Self::new(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_produces_json_schema() {
        let schema = Schema::object()
            .property("name", Schema::string().min_length(1), true)
            .property("count", Schema::integer().minimum(0.0), false)
            .strict();
        assert_eq!(
            schema.as_json(),
            &json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "minLength": 1},
                    "count": {"type": "integer", "minimum": 0.0}
                },
                "required": ["name"],
                "additionalProperties": false
            })
        );
        assert!(schema.is_required("name"));
        assert!(!schema.is_required("count"));
    }

    #[test]
    fn test_coerce_strings_by_declared_type() {
        let schema = Schema::object()
            .property("limit", Schema::integer(), false)
            .property("ratio", Schema::number(), false)
            .property("pretty", Schema::boolean(), false)
            .property("name", Schema::string(), false);
        let raw: BTreeMap<String, String> = [
            ("limit", "10"),
            ("ratio", "0.5"),
            ("pretty", "true"),
            ("name", "42"),
            ("undeclared", "x"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let value = schema.coerce_strings(&raw);
        assert_eq!(
            value,
            json!({"limit": 10, "ratio": 0.5, "pretty": true, "name": "42", "undeclared": "x"})
        );
    }

    #[test]
    fn test_uncoercible_value_fails_validation() {
        let schema = Schema::object().property("limit", Schema::integer(), true);
        let raw = BTreeMap::from([("limit".to_string(), "ten".to_string())]);
        let value = schema.coerce_strings(&raw);
        assert_eq!(value, json!({"limit": "ten"}));
        let errs = schema.validate(&value).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].path, "/limit");
    }

    #[test]
    fn test_nullable() {
        let schema = Schema::string().nullable();
        assert!(schema.validate(&Value::Null).is_ok());
        assert!(schema.validate(&json!("x")).is_ok());
        assert!(schema.validate(&json!(1)).is_err());
    }

    #[test]
    fn test_properties_iteration() {
        let schema = Schema::object()
            .property("b", Schema::string(), false)
            .property("a", Schema::integer(), true);
        let names: Vec<&str> = schema.properties().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
