//! Integration tests for the json-mustache-lsp server
//!
//! These tests run the diagnostic pipeline end-to-end with the real schema
//! engine, from document text to LSP diagnostics.

use std::fs;

use serde_json::{json, Value};
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

use json_mustache_lsp::config::Settings;
use json_mustache_lsp::diagnostics::DiagnosticBuilder;
use json_mustache_lsp::error::PipelineError;
use json_mustache_lsp::schema::JsonSchemaEngine;

const TEMPLATE_ID: &str = "file:///srv/payload.json.mustache";
const PLAIN_ID: &str = "file:///srv/payload.json";

/// Test helper to compute LSP diagnostics for a document
fn compute_diagnostics(identifier: &str, text: &str, schema: &Value) -> Vec<Diagnostic> {
    let settings = Settings::default();
    DiagnosticBuilder::new(&JsonSchemaEngine, &settings)
        .build(identifier, text, schema)
        .expect("schema should compile")
        .iter()
        .map(Diagnostic::from)
        .collect()
}

fn order_schema() -> Value {
    let text = fs::read_to_string("tests/fixtures/schemas/order.schema.json")
        .expect("Failed to read schema fixture");
    serde_json::from_str(&text).expect("schema fixture is JSON")
}

fn span(diagnostic: &Diagnostic) -> (u32, u32, u32, u32) {
    let range = diagnostic.range;
    (
        range.start.line,
        range.start.character,
        range.end.line,
        range.end.character,
    )
}

fn by_keyword<'d>(diagnostics: &'d [Diagnostic], keyword: &str) -> Option<&'d Diagnostic> {
    diagnostics
        .iter()
        .find(|d| d.data.as_ref().and_then(|data| data["keyword"].as_str()) == Some(keyword))
}

#[test]
fn test_valid_template_no_diagnostics() {
    let text = fs::read_to_string("tests/fixtures/valid/order.json.mustache")
        .expect("Failed to read fixture");

    let diagnostics = compute_diagnostics(TEMPLATE_ID, &text, &order_schema());

    assert!(
        diagnostics.is_empty(),
        "Expected no diagnostics for valid template, got: {:?}",
        diagnostics
    );
}

#[test]
fn test_valid_plain_document_no_diagnostics() {
    let text =
        fs::read_to_string("tests/fixtures/valid/order.json").expect("Failed to read fixture");

    let diagnostics = compute_diagnostics(PLAIN_ID, &text, &order_schema());
    assert!(diagnostics.is_empty(), "got: {:?}", diagnostics);
}

#[test]
fn test_invalid_template_reports_literal_violations() {
    let text = fs::read_to_string("tests/fixtures/invalid/order.json.mustache")
        .expect("Failed to read fixture");

    let diagnostics = compute_diagnostics(TEMPLATE_ID, &text, &order_schema());
    assert_eq!(diagnostics.len(), 3, "got: {:?}", diagnostics);

    let minimum = by_keyword(&diagnostics, "minimum").expect("minimum violation");
    assert_eq!(span(minimum), (2, 11, 2, 12));
    assert_eq!(minimum.severity, Some(DiagnosticSeverity::ERROR));

    let status = by_keyword(&diagnostics, "enum").expect("enum violation");
    assert_eq!(span(status), (3, 12, 3, 21));
    assert_eq!(status.message, r#"Value must be one of: "open", "closed""#);

    let note = by_keyword(&diagnostics, "additionalProperties").expect("unknown property");
    assert_eq!(span(note), (9, 2, 9, 8));
    assert_eq!(note.severity, Some(DiagnosticSeverity::WARNING));
    assert_eq!(note.message, r#"Property "note" is not allowed"#);
    assert_eq!(note.code, Some(NumberOrString::String("note".to_string())));
}

#[test]
fn test_placeholder_versus_literal_number() {
    let schema = json!({"properties": {"b": {"type": "number"}}});

    // The placeholder stands for a number at render time
    assert!(compute_diagnostics(TEMPLATE_ID, r#"{"b": {{count}}}"#, &schema).is_empty());

    let diagnostics = compute_diagnostics(TEMPLATE_ID, r#"{"a": {{x}}, "b": "five"}"#, &schema);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(span(&diagnostics[0]), (0, 18, 0, 24));
}

#[test]
fn test_diagnostic_metadata() {
    let schema = json!({"required": ["id"]});

    let diagnostics = compute_diagnostics(TEMPLATE_ID, r#"{"name": "{{n}}"}"#, &schema);
    assert_eq!(diagnostics.len(), 1);

    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.source.as_deref(), Some("json-mustache-lsp"));
    assert_eq!(diagnostic.message, r#"Missing required property "id""#);
    assert_eq!(diagnostic.code, Some(NumberOrString::String("id".to_string())));
    assert_eq!(diagnostic.data, Some(json!({"keyword": "required"})));
    // Root object: anchored on the opening brace
    assert_eq!(span(diagnostic), (0, 0, 0, 1));
}

#[test]
fn test_plain_document_is_not_neutralized() {
    let diagnostics = compute_diagnostics(PLAIN_ID, r#"{"b": {{count}}}"#, &json!({}));

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.starts_with("Invalid JSON: "));
    assert_eq!(span(&diagnostics[0]), (0, 0, 0, 0));
}

#[test]
fn test_syntax_error_reports_template_position() {
    let text = "{\n  \"a\": {{x}}\n  \"b\": 1\n}";
    let diagnostics = compute_diagnostics(TEMPLATE_ID, text, &json!({}));

    assert_eq!(diagnostics.len(), 1);
    let message = &diagnostics[0].message;
    assert!(
        message.starts_with("Invalid JSON after template neutralization: "),
        "{}",
        message
    );
    assert!(message.contains("near line 3"), "{}", message);
    assert_eq!(span(&diagnostics[0]), (0, 0, 0, 0));
}

#[test]
fn test_loop_trailing_separator_repaired() {
    let schema = json!({"type": "array", "items": {"type": "integer", "maximum": 10}});
    let text = "[\n  {{#rows}}\n  {{value}},\n  {{/rows}}\n  42,\n]";

    let diagnostics = compute_diagnostics(TEMPLATE_ID, text, &schema);
    assert_eq!(diagnostics.len(), 1, "got: {:?}", diagnostics);
    assert_eq!(span(&diagnostics[0]), (4, 2, 4, 4));
}

#[test]
fn test_triple_brace_and_comment_placeholders() {
    let schema = json!({"properties": {"n": {"maximum": 3}}});

    let diagnostics = compute_diagnostics(TEMPLATE_ID, r#"{"html": {{{body}}}, "n": 5}"#, &schema);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(span(&diagnostics[0]), (0, 26, 0, 27));

    let text = "{\n  {{! rendered by the billing job }}\n  \"n\": 5\n}";
    let diagnostics = compute_diagnostics(TEMPLATE_ID, text, &schema);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(span(&diagnostics[0]), (2, 7, 2, 8));
}

#[test]
fn test_utf16_columns_after_placeholder() {
    let schema = json!({"properties": {"bad": {"type": "integer"}}});
    let text = r#"{"name": "é", "n": {{n}}, "bad": "x"}"#;

    let diagnostics = compute_diagnostics(TEMPLATE_ID, text, &schema);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(span(&diagnostics[0]), (0, 33, 0, 36));
}

#[test]
fn test_duplicate_violations_collapsed() {
    let schema = json!({"allOf": [{"required": ["id"]}, {"required": ["id"]}]});

    let diagnostics = compute_diagnostics(PLAIN_ID, "{}", &schema);
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn test_conditional_branch_named_in_message() {
    let schema = json!({
        "allOf": [
            {"properties": {"kind": {"type": "string"}}},
            {
                "if": {"properties": {"kind": {"const": "card"}}},
                "then": {"required": ["last4"]}
            }
        ]
    });

    let diagnostics = compute_diagnostics(TEMPLATE_ID, r#"{"kind": "card", "ref": "{{r}}"}"#, &schema);
    assert_eq!(diagnostics.len(), 1, "got: {:?}", diagnostics);
    assert_eq!(
        diagnostics[0].message,
        r#"Missing required property "last4" (required by branch 1)"#
    );
}

#[test]
fn test_invalid_schema_aborts() {
    let settings = Settings::default();
    let result = DiagnosticBuilder::new(&JsonSchemaEngine, &settings).build(
        PLAIN_ID,
        "{}",
        &json!({"type": 12}),
    );

    assert!(matches!(result, Err(PipelineError::SchemaLoad(_))));
}

#[test]
fn test_custom_template_suffix() {
    let settings = Settings::from_value(Some(json!({
        "jsonMustache": {"templateSuffixes": [".json.tmpl"]}
    })))
    .unwrap();
    let builder = DiagnosticBuilder::new(&JsonSchemaEngine, &settings);

    assert!(builder
        .check_syntax("file:///a.json.tmpl", r#"{"a": {{x}}}"#)
        .is_empty());
    assert_eq!(
        builder
            .check_syntax("file:///a.json.mustache", r#"{"a": {{x}}}"#)
            .len(),
        1
    );
}
