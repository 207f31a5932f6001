//! Value validation backed by `jsonschema`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::Schema;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    /// JSON pointer to the offending value, `""` for the root.
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    /// Prefix the location, e.g. with `/body`.
    pub fn under(mut self, prefix: &str) -> Self {
        self.path = format!("{}{}", prefix, self.path);
        self
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A schema document that is not valid JSON Schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid schema: {0}")]
pub struct SchemaError(String);

/// A schema compiled once and reused for every request.
#[derive(Clone)]
pub struct CompiledSchema {
    validator: Arc<jsonschema::Validator>,
}

impl CompiledSchema {
    pub fn compile(schema: &Schema) -> Result<Self, SchemaError> {
        let validator = jsonschema::validator_for(schema.as_json())
            .map_err(|e| SchemaError(e.to_string()))?;
        Ok(Self {
            validator: Arc::new(validator),
        })
    }

    /// Check `value`, collecting every violation.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<SchemaViolation>> {
        let violations: Vec<SchemaViolation> = self
            .validator
            .iter_errors(value)
            .map(|e| SchemaViolation {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.validator.is_valid(value)
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema").finish_non_exhaustive()
    }
}
