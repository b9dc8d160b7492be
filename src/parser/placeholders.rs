//! Mustache placeholder detection and classification

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `{{{ raw }}}` is tried first so the tripled form is never split into
    /// a double-brace match plus a stray brace.
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"(?s)\{\{\{(.*?)\}\}\}|\{\{(.*?)\}\}").unwrap();
}

/// The role a placeholder plays in the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Variable substitution: `{{name}}`, `{{{name}}}`, `{{& name}}`
    Value,
    /// Section start: `{{#items}}`
    BlockOpen,
    /// Section end: `{{/items}}`
    BlockClose,
    /// Inverted section start: `{{^items}}`
    Negation,
    /// Comment: `{{! note }}`
    Comment,
    /// Partial include: `{{> other}}`
    Partial,
}

impl PlaceholderKind {
    /// Classify a placeholder from the first significant character of its body
    pub fn from_sigil(sigil: Option<char>) -> Self {
        match sigil {
            Some('#') => Self::BlockOpen,
            Some('^') => Self::Negation,
            Some('/') => Self::BlockClose,
            Some('!') => Self::Comment,
            Some('>') => Self::Partial,
            _ => Self::Value,
        }
    }

    /// Whether the tag is removed outright instead of replaced by a sample value
    pub fn is_elided(self) -> bool {
        !matches!(self, Self::Value)
    }
}

/// A single placeholder found in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Byte range of the whole tag, delimiters included
    pub range: Range<usize>,
    /// The expression with delimiters and sigil stripped
    pub expression: String,
    pub kind: PlaceholderKind,
}

/// Scan text for placeholder tags in document order
pub fn scan_placeholders(text: &str) -> Vec<Placeholder> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if let Some(raw) = caps.get(1) {
                return Some(Placeholder {
                    range: whole.range(),
                    expression: raw.as_str().trim().to_string(),
                    kind: PlaceholderKind::Value,
                });
            }

            let body = caps.get(2)?.as_str().trim_start();
            let sigil = body.chars().next().filter(|c| "#^/!>&".contains(*c));
            let expression = match sigil {
                Some(c) => &body[c.len_utf8()..],
                None => body,
            };

            Some(Placeholder {
                range: whole.range(),
                expression: expression.trim().to_string(),
                kind: PlaceholderKind::from_sigil(sigil),
            })
        })
        .collect()
}

/// Quick check used for routing before running the full transducer
pub fn contains_placeholders(text: &str) -> bool {
    PLACEHOLDER_RE.is_match(text)
}
