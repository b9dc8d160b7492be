//! Schema module: the validation engine seam and its default implementation

mod engine;

pub use engine::{JsonSchemaEngine, SchemaEngine, SchemaError, SchemaValidator, ValidationError};
