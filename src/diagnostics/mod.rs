//! Diagnostics module for error classification and reporting

mod builder;
mod classifier;
mod collector;

use serde::{Deserialize, Serialize};

pub use builder::DiagnosticBuilder;
pub use classifier::{classify_errors, ClassifiedError, PROBE_KEYWORDS, SAMPLE_SENSITIVE_KEYWORDS};
pub use collector::DiagnosticCollector;

/// Zero-based line/column range in the original document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRange {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic anchored in the original document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: DiagnosticRange,
    pub message: String,
    pub severity: Severity,
    /// Machine-readable detail for quick fixes: the offending or missing
    /// member name, or the allowed literal(s) as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Schema keyword that produced the diagnostic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}
