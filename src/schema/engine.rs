//! Schema validation engine seam
//!
//! The pipeline only needs `compile(schema) -> validator` and
//! `validate(instance) -> errors`. [`JsonSchemaEngine`] provides both on top
//! of the `jsonschema` crate; tests and embedders can supply their own.

use jsonschema::error::ValidationErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::parser::pointer::parse_pointer;

/// One violation reported by a schema engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// JSON pointer into the validated document
    pub instance_path: String,
    /// JSON pointer into the schema
    pub schema_path: String,
    pub keyword: String,
    pub message: String,
    /// Keyword-specific details (`missingProperty`, `additionalProperty`,
    /// `allowedValues`, `allowedValue`)
    #[serde(default)]
    pub params: Value,
}

impl ValidationError {
    pub fn new(
        instance_path: impl Into<String>,
        schema_path: impl Into<String>,
        keyword: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            instance_path: instance_path.into(),
            schema_path: schema_path.into(),
            keyword: keyword.into(),
            message: message.into(),
            params: json!({}),
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// String parameter by name
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }
}

/// Failure to turn a schema value into a validator
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// A compiled schema
pub trait SchemaValidator: Send + Sync {
    /// Validate an instance, returning every violation in engine order
    fn validate(&self, instance: &Value) -> Result<(), Vec<ValidationError>>;
}

/// Something that compiles schemas
pub trait SchemaEngine: Send + Sync {
    fn compile(&self, schema: &Value) -> Result<Box<dyn SchemaValidator>, SchemaError>;
}

/// Engine backed by the `jsonschema` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSchemaEngine;

impl SchemaEngine for JsonSchemaEngine {
    fn compile(&self, schema: &Value) -> Result<Box<dyn SchemaValidator>, SchemaError> {
        let validator =
            jsonschema::validator_for(schema).map_err(|err| SchemaError::Invalid(err.to_string()))?;
        Ok(Box::new(JsonSchemaValidator { validator }))
    }
}

struct JsonSchemaValidator {
    validator: jsonschema::Validator,
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, instance: &Value) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = self
            .validator
            .iter_errors(instance)
            .flat_map(|error| convert_error(&error))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Translate a `jsonschema` error; one entry per unexpected property
fn convert_error(error: &jsonschema::ValidationError<'_>) -> Vec<ValidationError> {
    let instance_path = error.instance_path.to_string();
    let schema_path = error.schema_path.to_string();
    let keyword = parse_pointer(&schema_path).pop().unwrap_or_default();
    let base = ValidationError::new(instance_path, schema_path, keyword, error.to_string());

    match &error.kind {
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|key| {
                base.clone()
                    .with_params(json!({ "additionalProperty": key }))
            })
            .collect(),
        ValidationErrorKind::Required { property } => {
            vec![base.with_params(json!({ "missingProperty": property }))]
        }
        ValidationErrorKind::Enum { options } => {
            vec![base.with_params(json!({ "allowedValues": options }))]
        }
        ValidationErrorKind::Constant { expected_value } => {
            vec![base.with_params(json!({ "allowedValue": expected_value }))]
        }
        _ => vec![base],
    }
}
