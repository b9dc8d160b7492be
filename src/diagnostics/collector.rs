//! Diagnostic collection and LSP conversion

use tower_lsp::lsp_types::{self, NumberOrString, Position, Range};

use super::classifier::ClassifiedError;
use super::{Diagnostic, DiagnosticRange, Severity};

/// Source name attached to every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "json-mustache-lsp";

/// Collects diagnostics during one validation run
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document syntax error, anchored at the start of the document
    pub fn add_syntax_error(&mut self, message: String) {
        self.diagnostics.push(Diagnostic {
            range: DiagnosticRange::default(),
            message,
            severity: Severity::Error,
            code: None,
            keyword: None,
        });
    }

    /// Add a classified schema violation at the given range
    pub fn add_violation(&mut self, range: DiagnosticRange, error: ClassifiedError) {
        self.diagnostics.push(Diagnostic {
            range,
            message: error.message,
            severity: error.severity,
            code: error.code,
            keyword: Some(error.error.keyword),
        });
    }

    /// Convert into the final list of diagnostics
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl From<&Diagnostic> for lsp_types::Diagnostic {
    fn from(diagnostic: &Diagnostic) -> Self {
        let range = diagnostic.range;
        lsp_types::Diagnostic {
            range: Range {
                start: Position {
                    line: range.start_line,
                    character: range.start_col,
                },
                end: Position {
                    line: range.end_line,
                    character: range.end_col,
                },
            },
            severity: Some(match diagnostic.severity {
                Severity::Error => lsp_types::DiagnosticSeverity::ERROR,
                Severity::Warning => lsp_types::DiagnosticSeverity::WARNING,
            }),
            code: diagnostic.code.clone().map(NumberOrString::String),
            code_description: None,
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            message: diagnostic.message.clone(),
            related_information: None,
            tags: None,
            data: diagnostic
                .keyword
                .as_ref()
                .map(|keyword| serde_json::json!({ "keyword": keyword })),
        }
    }
}
