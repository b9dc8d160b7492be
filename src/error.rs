//! Pipeline errors

use thiserror::Error;

use crate::schema::SchemaError;

/// Failures that abort a validation run.
///
/// Document problems never end up here: syntax errors and schema
/// violations are reported as diagnostics.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load schema: {0}")]
    SchemaLoad(#[from] SchemaError),
}
