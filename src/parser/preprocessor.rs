//! Placeholder neutralization
//!
//! This module replaces mustache tags with text a JSON parser accepts while
//! recording a [`SourceMap`] so positions in the cleaned text can be traced
//! back to the template.
//!
//! Section tags (`{{#x}}`, `{{^x}}`, `{{/x}}`), comments and partials are
//! removed and the section body is kept once, verbatim. Value tags become a
//! sample literal, quoted or bare depending on whether the tag already sits
//! inside a JSON string.

use crate::mapping::{Segment, SourceMap};

use super::placeholders::scan_placeholders;

/// Literal substituted for value placeholders
pub const SAMPLE_VALUE: &str = "sample";

/// How many characters before a value tag are inspected for quote context
const QUOTE_WINDOW: usize = 200;

/// Result of neutralizing a template
#[derive(Debug, Clone)]
pub struct Neutralized {
    /// Text with every placeholder replaced
    pub text: String,
    /// Mapping from `text` back to the template
    pub map: SourceMap,
    pub has_placeholders: bool,
}

/// Replace every placeholder in `text` and record the segment list.
pub fn neutralize_placeholders(text: &str) -> Neutralized {
    let placeholders = scan_placeholders(text);

    if placeholders.is_empty() {
        return Neutralized {
            text: text.to_string(),
            map: SourceMap::identity(text.len()),
            has_placeholders: false,
        };
    }

    let mut cleaned = String::with_capacity(text.len());
    let mut segments = Vec::with_capacity(placeholders.len() * 2 + 1);
    let mut cursor = 0;

    for placeholder in &placeholders {
        let range = placeholder.range.clone();

        if range.start > cursor {
            segments.push(Segment::text(cursor..range.start, cleaned.len()));
            cleaned.push_str(&text[cursor..range.start]);
        }

        tracing::trace!(
            expression = %placeholder.expression,
            kind = ?placeholder.kind,
            "Neutralizing placeholder"
        );
        let replacement = if placeholder.kind.is_elided() {
            String::new()
        } else {
            sample_for(text, range.start)
        };
        segments.push(Segment::placeholder(
            placeholder.kind,
            range.clone(),
            cleaned.len(),
            replacement.clone(),
        ));
        cleaned.push_str(&replacement);

        cursor = range.end;
    }

    if cursor < text.len() {
        segments.push(Segment::text(cursor..text.len(), cleaned.len()));
        cleaned.push_str(&text[cursor..]);
    }

    Neutralized {
        text: cleaned,
        map: SourceMap::new(segments),
        has_placeholders: true,
    }
}

/// Choose the sample literal for a value tag starting at `at`.
///
/// This is a heuristic: it looks back for the latest unescaped `:` or `[`
/// and counts unescaped double quotes after it. An odd count means the tag
/// is inside a string literal already.
fn sample_for(text: &str, at: usize) -> String {
    if inside_string(text, at) {
        SAMPLE_VALUE.to_string()
    } else {
        format!("\"{}\"", SAMPLE_VALUE)
    }
}

fn inside_string(text: &str, at: usize) -> bool {
    let before = &text[..at];
    let window_start = before
        .char_indices()
        .rev()
        .nth(QUOTE_WINDOW - 1)
        .map_or(0, |(i, _)| i);
    let window = &before[window_start..];
    let bytes = window.as_bytes();

    let delimiter = (0..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b':' | b'[') && !is_escaped(bytes, i));

    match delimiter {
        Some(pos) => {
            let quotes = (pos + 1..bytes.len())
                .filter(|&i| bytes[i] == b'"' && !is_escaped(bytes, i))
                .count();
            quotes % 2 == 1
        }
        None => false,
    }
}

/// Whether the byte at `i` is preceded by an odd run of backslashes
fn is_escaped(bytes: &[u8], i: usize) -> bool {
    bytes[..i].iter().rev().take_while(|&&b| b == b'\\').count() % 2 == 1
}
