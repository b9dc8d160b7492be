//! Parser module for template neutralization and JSON handling

pub mod json;
mod placeholders;
pub mod pointer;
mod postprocess;
mod preprocessor;

pub use json::{parse_tree, parse_value, Literal, NodeKind, SyntaxError, SyntaxNode};
pub use placeholders::{contains_placeholders, scan_placeholders, Placeholder, PlaceholderKind};
pub use postprocess::repair_trailing_separators;
pub use preprocessor::{neutralize_placeholders, Neutralized, SAMPLE_VALUE};
