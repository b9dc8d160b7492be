//! Validation error filtering and annotation
//!
//! Turns the engine's raw violations into the list the builder anchors:
//! conditional probes are dropped, complaints about synthesized sample
//! values are suppressed, duplicates are removed, and every survivor gets a
//! message, a severity and an optional quick-fix code.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::mapping::SourceMap;
use crate::parser::pointer::{format_pointer, parse_pointer, resolve};
use crate::parser::SyntaxNode;
use crate::schema::ValidationError;

use super::Severity;

/// Keywords that only report which conditional branch failed to match
pub const PROBE_KEYWORDS: &[&str] = &["if"];

/// Keywords whose complaints are meaningless against a sample value
pub const SAMPLE_SENSITIVE_KEYWORDS: &[&str] = &["type", "format", "enum", "const", "pattern"];

lazy_static! {
    static ref BRANCH_RE: Regex =
        Regex::new(r"/(?:allOf|anyOf|oneOf)/(\d+)/(?:[^/]+/)*?(?:then|else)/").unwrap();
}

/// A violation that survived filtering
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedError {
    pub error: ValidationError,
    /// Decoded instance path
    pub path: Vec<String>,
    /// Offending (`additionalProperties`) or missing (`required`) member
    pub member: Option<String>,
    pub message: String,
    pub severity: Severity,
    pub code: Option<String>,
}

/// Filter, deduplicate and annotate engine errors.
///
/// `source_map` is present only when the document contained placeholders;
/// it enables suppression of errors raised against synthesized values.
/// Engine order is preserved.
pub fn classify_errors(
    errors: Vec<ValidationError>,
    tree: &SyntaxNode,
    source_map: Option<&SourceMap>,
) -> Vec<ClassifiedError> {
    let mut seen = HashSet::new();
    let mut classified = Vec::with_capacity(errors.len());

    for error in errors {
        if PROBE_KEYWORDS.contains(&error.keyword.as_str()) {
            continue;
        }

        let path = parse_pointer(&error.instance_path);

        if let Some(map) = source_map {
            if is_sample_artifact(&error, &path, tree, map) {
                tracing::debug!(
                    path = %error.instance_path,
                    keyword = %error.keyword,
                    "Suppressing error on synthesized value"
                );
                continue;
            }
        }

        let member = member_of(&error);
        let mut anchor = path.clone();
        anchor.extend(member.iter().cloned());
        if !seen.insert(format_pointer(&anchor)) {
            continue;
        }

        classified.push(annotate(error, path, member));
    }

    classified
}

fn is_sample_artifact(
    error: &ValidationError,
    path: &[String],
    tree: &SyntaxNode,
    map: &SourceMap,
) -> bool {
    if !SAMPLE_SENSITIVE_KEYWORDS.contains(&error.keyword.as_str()) {
        return false;
    }
    resolve(tree, path).is_some_and(|node| map.overlaps_synthesized(&node.range()))
}

fn member_of(error: &ValidationError) -> Option<String> {
    let name = match error.keyword.as_str() {
        "additionalProperties" => error.param_str("additionalProperty"),
        "required" => error.param_str("missingProperty"),
        _ => None,
    };
    name.map(str::to_string)
}

fn annotate(error: ValidationError, path: Vec<String>, member: Option<String>) -> ClassifiedError {
    let (message, code) = match error.keyword.as_str() {
        "required" => match &member {
            Some(name) => {
                let suffix = required_branch(&error.schema_path)
                    .map(|branch| format!(" (required by branch {})", branch))
                    .unwrap_or_default();
                (
                    format!("Missing required property \"{}\"{}", name, suffix),
                    Some(name.clone()),
                )
            }
            None => (error.message.clone(), None),
        },
        "additionalProperties" => match &member {
            Some(name) => (
                format!("Property \"{}\" is not allowed", name),
                Some(name.clone()),
            ),
            None => (error.message.clone(), None),
        },
        "enum" => match error.params.get("allowedValues").and_then(Value::as_array) {
            Some(allowed) => (
                format!("Value must be one of: {}", join_literals(allowed)),
                Some(Value::Array(allowed.clone()).to_string()),
            ),
            None => (error.message.clone(), None),
        },
        "const" => match error.params.get("allowedValue") {
            Some(expected) => (
                format!("Value must be {}", expected),
                Some(expected.to_string()),
            ),
            None => (error.message.clone(), None),
        },
        _ => (error.message.clone(), None),
    };

    let severity = match error.keyword.as_str() {
        "additionalProperties" => Severity::Warning,
        _ => Severity::Error,
    };

    ClassifiedError {
        error,
        path,
        member,
        message,
        severity,
        code,
    }
}

/// Branch index when a `required` comes from a conditional inside a combinator
fn required_branch(schema_path: &str) -> Option<usize> {
    BRANCH_RE
        .captures_iter(schema_path)
        .last()
        .and_then(|caps| caps.get(1)?.as_str().parse().ok())
}

fn join_literals(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
