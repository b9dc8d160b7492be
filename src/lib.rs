//! json-mustache-lsp: LSP server library for JSON documents written as mustache templates
//!
//! This library provides the core functionality for the json-mustache-lsp server:
//! - Placeholder neutralization for `{{...}}` and `{{{...}}}` tags
//! - Offset mapping between the neutralized JSON and the original template
//! - JSON Schema validation with template-aware error filtering
//! - Diagnostic collection and reporting
//!
//! # Example
//!
//! ```
//! use json_mustache_lsp::config::Settings;
//! use json_mustache_lsp::diagnostics::DiagnosticBuilder;
//! use json_mustache_lsp::schema::JsonSchemaEngine;
//! use serde_json::json;
//!
//! let schema = json!({"type": "object", "properties": {"count": {"type": "integer"}}});
//! let settings = Settings::default();
//! let builder = DiagnosticBuilder::new(&JsonSchemaEngine, &settings);
//!
//! let text = r#"{"count": {{count}}}"#;
//! let diagnostics = builder.build("file:///payload.json.mustache", text, &schema).unwrap();
//! assert!(diagnostics.is_empty());
//! ```

pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod mapping;
pub mod parser;
pub mod schema;

mod backend;

pub use backend::Backend;
