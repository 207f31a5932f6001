//! Declared endpoints.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::routing::method::HttpMethod;
use crate::schema::Schema;

/// One declared endpoint: method, path template, schemas and metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDefinition {
    pub method: HttpMethod,

    /// Template such as `/api/v1/items/:id`.
    pub path: String,

    pub description: String,

    /// Declaration order is kept; repeats are dropped.
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub params_schema: Option<Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_schema: Option<Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_schema: Option<Schema>,

    pub response_schema: Schema,

    /// Status code → error body schema.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub error_response_schemas: BTreeMap<u16, Schema>,
}

impl RouteDefinition {
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        description: impl Into<String>,
        response_schema: Schema,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            description: description.into(),
            tags: Vec::new(),
            params_schema: None,
            query_schema: None,
            body_schema: None,
            response_schema,
            error_response_schemas: BTreeMap::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    pub fn with_params(mut self, schema: Schema) -> Self {
        self.params_schema = Some(schema);
        self
    }

    pub fn with_query(mut self, schema: Schema) -> Self {
        self.query_schema = Some(schema);
        self
    }

    pub fn with_body(mut self, schema: Schema) -> Self {
        self.body_schema = Some(schema);
        self
    }

    /// Declare the body returned with `status`.
    pub fn with_error(mut self, status: u16, schema: Schema) -> Self {
        self.error_response_schemas.insert(status, schema);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
