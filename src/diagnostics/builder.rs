//! End-to-end diagnostic construction
//!
//! Template documents are neutralized and repaired, parsed, validated, and
//! every surviving error is anchored in the cleaned tree before being
//! mapped back to the template. Plain documents skip neutralization and
//! mapping entirely.

use std::ops::Range;

use serde_json::Value;

use crate::config::Settings;
use crate::error::PipelineError;
use crate::mapping::{LineIndex, SourceMap};
use crate::parser::json::{clean_error_message, extract_error_position};
use crate::parser::pointer::{find_member, resolve_nearest};
use crate::parser::{
    contains_placeholders, neutralize_placeholders, parse_tree, parse_value,
    repair_trailing_separators, Neutralized, SyntaxNode,
};
use crate::schema::{SchemaEngine, SchemaValidator};

use super::classifier::{classify_errors, ClassifiedError};
use super::collector::DiagnosticCollector;
use super::{Diagnostic, DiagnosticRange};

/// Text prepared for parsing
enum Prepared<'t> {
    Plain(&'t str),
    Template(Neutralized),
}

impl Prepared<'_> {
    fn text(&self) -> &str {
        match self {
            Prepared::Plain(text) => text,
            Prepared::Template(neutralized) => &neutralized.text,
        }
    }

    fn map(&self) -> Option<&SourceMap> {
        match self {
            Prepared::Plain(_) => None,
            Prepared::Template(neutralized) => Some(&neutralized.map),
        }
    }
}

/// Orchestrates one validation run over a document snapshot
pub struct DiagnosticBuilder<'a> {
    engine: &'a dyn SchemaEngine,
    settings: &'a Settings,
}

impl<'a> DiagnosticBuilder<'a> {
    pub fn new(engine: &'a dyn SchemaEngine, settings: &'a Settings) -> Self {
        Self { engine, settings }
    }

    /// Validate `text` against `schema`.
    ///
    /// Fails only when the schema cannot be compiled; document problems are
    /// returned as diagnostics.
    pub fn build(
        &self,
        identifier: &str,
        text: &str,
        schema: &Value,
    ) -> Result<Vec<Diagnostic>, PipelineError> {
        let validator = self.engine.compile(schema)?;
        Ok(self.run(identifier, text, Some(validator.as_ref())))
    }

    /// Report syntax problems only, for documents without a schema
    pub fn check_syntax(&self, identifier: &str, text: &str) -> Vec<Diagnostic> {
        self.run(identifier, text, None)
    }

    fn prepare<'t>(&self, identifier: &str, text: &'t str) -> Prepared<'t> {
        if self.settings.is_template_document(identifier) && contains_placeholders(text) {
            let neutralized = repair_trailing_separators(neutralize_placeholders(text));
            tracing::debug!(
                identifier,
                segments = neutralized.map.segments().len(),
                "Neutralized template placeholders"
            );
            Prepared::Template(neutralized)
        } else {
            Prepared::Plain(text)
        }
    }

    fn run(
        &self,
        identifier: &str,
        text: &str,
        validator: Option<&dyn SchemaValidator>,
    ) -> Vec<Diagnostic> {
        let prepared = self.prepare(identifier, text);
        let cleaned = prepared.text();
        let mut collector = DiagnosticCollector::new();

        let value = match parse_value(cleaned) {
            Ok(value) => value,
            Err(err) => {
                collector.add_syntax_error(syntax_message(&err.to_string(), &prepared, text));
                return collector.into_diagnostics();
            }
        };
        let tree = match parse_tree(cleaned) {
            Ok(tree) => tree,
            Err(err) => {
                collector.add_syntax_error(syntax_message(&err.message, &prepared, text));
                return collector.into_diagnostics();
            }
        };

        let Some(validator) = validator else {
            return collector.into_diagnostics();
        };
        let errors = match validator.validate(&value) {
            Ok(()) => return collector.into_diagnostics(),
            Err(errors) => errors,
        };
        tracing::debug!(identifier, count = errors.len(), "Schema validation failed");

        let index = LineIndex::new(text);
        for error in classify_errors(errors, &tree, prepared.map()) {
            let cleaned_range = anchor_range(&tree, &error);
            let original = match prepared.map() {
                Some(map) => map.to_original_range(cleaned_range),
                None => cleaned_range,
            };
            collector.add_violation(to_diagnostic_range(&index, original), error);
        }

        collector.into_diagnostics()
    }
}

/// Pick the cleaned-text range a classified error should underline
fn anchor_range(tree: &SyntaxNode, error: &ClassifiedError) -> Range<usize> {
    let resolution = resolve_nearest(tree, &error.path);
    if !resolution.exact {
        tracing::debug!(
            path = %error.error.instance_path,
            "No node at path, anchoring to nearest ancestor"
        );
        return resolution.node.head_range();
    }

    match error.error.keyword.as_str() {
        "additionalProperties" => error
            .member
            .as_deref()
            .and_then(|member| find_member(resolution.node, member))
            .and_then(SyntaxNode::key)
            .map_or_else(|| resolution.node.head_range(), SyntaxNode::range),
        "required" => resolution
            .key
            .map_or_else(|| resolution.node.head_range(), SyntaxNode::range),
        _ => resolution.node.range(),
    }
}

fn to_diagnostic_range(index: &LineIndex<'_>, range: Range<usize>) -> DiagnosticRange {
    let start = index.line_col(range.start);
    let end = index.line_col(range.end);
    DiagnosticRange {
        start_line: start.line,
        start_col: start.col,
        end_line: end.line,
        end_col: end.col,
    }
}

/// Build the syntax error message, re-expressing the parser's position in
/// template coordinates when the text was neutralized
fn syntax_message(message: &str, prepared: &Prepared<'_>, original: &str) -> String {
    let Some(map) = prepared.map() else {
        return format!("Invalid JSON: {}", message);
    };

    let detail = clean_error_message(message);
    match extract_error_position(message) {
        Some((line, column)) => {
            let cleaned_offset = LineIndex::new(prepared.text()).offset_of(line, column);
            let position = LineIndex::new(original).line_col(map.to_original(cleaned_offset));
            format!(
                "Invalid JSON after template neutralization: {} near line {}, column {}",
                detail,
                position.line + 1,
                position.col + 1
            )
        }
        None => format!("Invalid JSON after template neutralization: {}", detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::schema::{SchemaError, ValidationError};
    use serde_json::json;

    /// Engine that reports a fixed error list for any instance
    struct ScriptedEngine {
        errors: Vec<ValidationError>,
    }

    struct ScriptedValidator {
        errors: Vec<ValidationError>,
    }

    impl SchemaValidator for ScriptedValidator {
        fn validate(&self, _instance: &Value) -> Result<(), Vec<ValidationError>> {
            if self.errors.is_empty() {
                Ok(())
            } else {
                Err(self.errors.clone())
            }
        }
    }

    impl SchemaEngine for ScriptedEngine {
        fn compile(&self, schema: &Value) -> Result<Box<dyn SchemaValidator>, SchemaError> {
            if schema.is_null() {
                return Err(SchemaError::Invalid("null schema".to_string()));
            }
            Ok(Box::new(ScriptedValidator {
                errors: self.errors.clone(),
            }))
        }
    }

    const TEMPLATE_ID: &str = "file:///payload.json.mustache";
    const PLAIN_ID: &str = "file:///payload.json";

    fn build(identifier: &str, text: &str, errors: Vec<ValidationError>) -> Vec<Diagnostic> {
        let engine = ScriptedEngine { errors };
        let settings = Settings::default();
        DiagnosticBuilder::new(&engine, &settings)
            .build(identifier, text, &json!({}))
            .unwrap()
    }

    fn range(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> DiagnosticRange {
        DiagnosticRange {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    #[test]
    fn test_valid_document_no_diagnostics() {
        assert!(build(TEMPLATE_ID, r#"{"a": {{x}}}"#, vec![]).is_empty());
    }

    #[test]
    fn test_schema_load_error_aborts() {
        let engine = ScriptedEngine { errors: vec![] };
        let settings = Settings::default();
        let result = DiagnosticBuilder::new(&engine, &settings).build(PLAIN_ID, "{}", &Value::Null);
        assert!(matches!(result, Err(PipelineError::SchemaLoad(_))));
    }

    #[test]
    fn test_error_after_placeholder_maps_to_template() {
        let text = "{\n  \"a\": {{a_value}},\n  \"b\": \"text\"\n}";
        let errors = vec![ValidationError::new("/b", "/properties/b/type", "type", "must be number")];

        let diagnostics = build(TEMPLATE_ID, text, errors);
        assert_eq!(diagnostics.len(), 1);
        // `"text"` on line 2
        assert_eq!(diagnostics[0].range, range(2, 7, 2, 13));
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].keyword.as_deref(), Some("type"));
    }

    #[test]
    fn test_placeholder_value_error_suppressed() {
        let text = r#"{"b": {{count}}}"#;
        let errors = vec![ValidationError::new("/b", "/properties/b/type", "type", "must be number")];
        assert!(build(TEMPLATE_ID, text, errors).is_empty());
    }

    #[test]
    fn test_plain_document_skips_neutralization() {
        // Without the template suffix the braces are plain JSON syntax errors
        let diagnostics = build(PLAIN_ID, r#"{"b": {{count}}}"#, vec![]);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.starts_with("Invalid JSON: "));
        assert_eq!(diagnostics[0].range, DiagnosticRange::default());
    }

    #[test]
    fn test_template_without_placeholders_is_plain() {
        let text = r#"{"b": "x"}"#;
        let errors = vec![ValidationError::new("/b", "/properties/b/type", "type", "must be number")];

        let diagnostics = build(TEMPLATE_ID, text, errors);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range, range(0, 6, 0, 9));
    }

    #[test]
    fn test_syntax_error_after_neutralization() {
        let text = "{\n  \"a\": {{x}}\n  \"b\": 1\n}";
        let diagnostics = build(TEMPLATE_ID, text, vec![]);

        assert_eq!(diagnostics.len(), 1);
        let message = &diagnostics[0].message;
        assert!(message.starts_with("Invalid JSON after template neutralization: "));
        assert!(message.contains("near line 3"), "{}", message);
        assert_eq!(diagnostics[0].range, DiagnosticRange::default());
    }

    #[test]
    fn test_additional_property_anchors_on_key() {
        let text = "{\n  \"name\": \"{{n}}\",\n  \"extra\": 1\n}";
        let errors = vec![ValidationError::new(
            "",
            "/additionalProperties",
            "additionalProperties",
            "not allowed",
        )
        .with_params(json!({"additionalProperty": "extra"}))];

        let diagnostics = build(TEMPLATE_ID, text, errors);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range, range(2, 2, 2, 9));
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].code.as_deref(), Some("extra"));
    }

    #[test]
    fn test_required_anchors_on_owning_key() {
        let text = "{\n  \"config\": {\"x\": {{x}}}\n}";
        let errors = vec![ValidationError::new(
            "/config",
            "/properties/config/required",
            "required",
            "missing",
        )
        .with_params(json!({"missingProperty": "name"}))];

        let diagnostics = build(TEMPLATE_ID, text, errors);
        assert_eq!(diagnostics[0].range, range(1, 2, 1, 10));
        assert_eq!(diagnostics[0].message, "Missing required property \"name\"");
    }

    #[test]
    fn test_required_on_root_anchors_on_brace() {
        let errors = vec![ValidationError::new("", "/required", "required", "missing")
            .with_params(json!({"missingProperty": "id"}))];

        let diagnostics = build(PLAIN_ID, "  {}", errors);
        assert_eq!(diagnostics[0].range, range(0, 2, 0, 3));
    }

    #[test]
    fn test_missing_path_still_reported() {
        let text = r#"{"a": {"b": {{v}}}}"#;
        let errors = vec![ValidationError::new(
            "/a/missing",
            "/properties/a/properties/missing/type",
            "minimum",
            "too small",
        )];

        let diagnostics = build(TEMPLATE_ID, text, errors);
        assert_eq!(diagnostics.len(), 1);
        // falls back to the opening brace of `a`'s object
        assert_eq!(diagnostics[0].range, range(0, 6, 0, 7));
        assert_eq!(diagnostics[0].message, "too small");
    }

    #[test]
    fn test_error_inside_loop_body() {
        let text = "[\n{{#items}}\n  {\"id\": {{id}}, \"qty\": -1},\n{{/items}}\n]";
        let errors = vec![ValidationError::new("/0/qty", "/items/properties/qty/minimum", "minimum", "must be >= 0")];

        let diagnostics = build(TEMPLATE_ID, text, errors);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range, range(2, 24, 2, 26));
    }

    #[test]
    fn test_range_end_stops_before_section_close() {
        let text = r#"{"a": {{#f}}"x"{{/f}}}"#;
        let errors = vec![ValidationError::new("/a", "/properties/a/type", "type", "must be number")];

        let diagnostics = build(TEMPLATE_ID, text, errors);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range, range(0, 12, 0, 15));
    }

    #[test]
    fn test_check_syntax_only() {
        let engine = ScriptedEngine { errors: vec![] };
        let settings = Settings::default();
        let builder = DiagnosticBuilder::new(&engine, &settings);

        assert!(builder.check_syntax(TEMPLATE_ID, r#"{"a": {{x}}}"#).is_empty());
        assert_eq!(builder.check_syntax(PLAIN_ID, "{").len(), 1);
    }
}
