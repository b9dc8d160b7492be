//! JSON parsing with source offsets
//!
//! `serde_json` produces the value handed to the schema engine and the
//! user-facing syntax error. [`parse_tree`] builds a positional tree over
//! the same text so validation errors can be anchored to exact byte ranges.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Node kinds of the positional tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    /// A `key: value` pair inside an object; children are `[Key, value]`
    Property,
    /// The key string of a property
    Key,
    String,
    Number,
    Boolean,
    Null,
}

/// Literal payload of scalar and key nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    /// Kept as written
    Number(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub offset: usize,
    pub length: usize,
    pub children: Vec<SyntaxNode>,
    pub value: Option<Literal>,
}

impl SyntaxNode {
    fn leaf(kind: NodeKind, range: Range<usize>, value: Literal) -> Self {
        Self {
            kind,
            offset: range.start,
            length: range.len(),
            children: Vec::new(),
            value: Some(value),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    /// The opening bracket of a container, or the whole node for scalars
    pub fn head_range(&self) -> Range<usize> {
        match self.kind {
            NodeKind::Object | NodeKind::Array => self.offset..self.offset + 1,
            _ => self.range(),
        }
    }

    /// Decoded text of a string or key node
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Some(Literal::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Key node of a property
    pub fn key(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::Property => self.children.first(),
            _ => None,
        }
    }

    /// Value node of a property
    pub fn property_value(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::Property => self.children.get(1),
            _ => None,
        }
    }
}

/// A syntax error with the parser's message and a byte offset
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
}

/// Parse text into a [`serde_json::Value`]
pub fn parse_value(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text)
}

/// Build the positional tree for a JSON document
pub fn parse_tree(text: &str) -> Result<SyntaxNode, SyntaxError> {
    let mut parser = TreeParser {
        bytes: text.as_bytes(),
        text,
        pos: 0,
    };
    parser.skip_whitespace();
    let root = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < parser.bytes.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(root)
}

struct TreeParser<'a> {
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl TreeParser<'_> {
    fn error(&self, message: &str) -> SyntaxError {
        SyntaxError {
            message: message.to_string(),
            offset: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8, message: &str) -> Result<(), SyntaxError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn parse_value(&mut self) -> Result<SyntaxNode, SyntaxError> {
        match self.peek() {
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => {
                let (range, text) = self.parse_string()?;
                Ok(SyntaxNode::leaf(NodeKind::String, range, Literal::String(text)))
            }
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            Some(b't') => self.parse_keyword("true", Literal::Boolean(true)),
            Some(b'f') => self.parse_keyword("false", Literal::Boolean(false)),
            Some(b'n') => self.parse_keyword("null", Literal::Null),
            Some(_) => Err(self.error("expected value")),
            None => Err(self.error("EOF while parsing a value")),
        }
    }

    fn parse_object(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        let mut children = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
        } else {
            loop {
                self.skip_whitespace();
                if self.peek() != Some(b'"') {
                    return Err(self.error("key must be a string"));
                }
                let (key_range, key) = self.parse_string()?;
                let key_node = SyntaxNode::leaf(NodeKind::Key, key_range.clone(), Literal::String(key));

                self.skip_whitespace();
                self.expect(b':', "expected `:`")?;
                self.skip_whitespace();
                let value = self.parse_value()?;

                let end = value.range().end;
                children.push(SyntaxNode {
                    kind: NodeKind::Property,
                    offset: key_range.start,
                    length: end - key_range.start,
                    children: vec![key_node, value],
                    value: None,
                });

                self.skip_whitespace();
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b'}') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected `,` or `}`")),
                }
            }
        }

        Ok(SyntaxNode {
            kind: NodeKind::Object,
            offset: start,
            length: self.pos - start,
            children,
            value: None,
        })
    }

    fn parse_array(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        let mut children = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
        } else {
            loop {
                self.skip_whitespace();
                children.push(self.parse_value()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b']') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected `,` or `]`")),
                }
            }
        }

        Ok(SyntaxNode {
            kind: NodeKind::Array,
            offset: start,
            length: self.pos - start,
            children,
            value: None,
        })
    }

    /// Parse a string literal starting at the opening quote
    fn parse_string(&mut self) -> Result<(Range<usize>, String), SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        let mut run_start = self.pos;

        loop {
            match self.peek() {
                None => return Err(self.error("EOF while parsing a string")),
                Some(b'"') => {
                    out.push_str(&self.text[run_start..self.pos]);
                    self.pos += 1;
                    return Ok((start..self.pos, out));
                }
                Some(b'\\') => {
                    out.push_str(&self.text[run_start..self.pos]);
                    self.pos += 1;
                    self.parse_escape(&mut out)?;
                    run_start = self.pos;
                }
                Some(c) if c < 0x20 => {
                    return Err(self.error("control character in string"));
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), SyntaxError> {
        let escaped = self.peek().ok_or_else(|| self.error("EOF while parsing a string"))?;
        self.pos += 1;
        let ch = match escaped {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let high = self.parse_hex4()?;
                if (0xD800..0xDC00).contains(&high) && self.bytes[self.pos..].starts_with(b"\\u") {
                    self.pos += 2;
                    let low = self.parse_hex4()?;
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF);
                    char::from_u32(combined).unwrap_or('\u{FFFD}')
                } else {
                    char::from_u32(high).unwrap_or('\u{FFFD}')
                }
            }
            _ => return Err(self.error("invalid escape")),
        };
        out.push(ch);
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u32, SyntaxError> {
        let digits = self
            .text
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| self.error("EOF while parsing a string"))?;
        let value =
            u32::from_str_radix(digits, 16).map_err(|_| self.error("invalid unicode escape"))?;
        self.pos += 4;
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        if !self.eat_digits() {
            return Err(self.error("invalid number"));
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if !self.eat_digits() {
                return Err(self.error("invalid number"));
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !self.eat_digits() {
                return Err(self.error("invalid number"));
            }
        }

        let raw = self.text[start..self.pos].to_string();
        Ok(SyntaxNode::leaf(NodeKind::Number, start..self.pos, Literal::Number(raw)))
    }

    fn eat_digits(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_keyword(&mut self, word: &str, literal: Literal) -> Result<SyntaxNode, SyntaxError> {
        if !self.bytes[self.pos..].starts_with(word.as_bytes()) {
            return Err(self.error("expected value"));
        }
        let start = self.pos;
        self.pos += word.len();
        let kind = match literal {
            Literal::Boolean(_) => NodeKind::Boolean,
            _ => NodeKind::Null,
        };
        Ok(SyntaxNode::leaf(kind, start..self.pos, literal))
    }
}

/// Extract the 1-based line and column from a parser error message
///
/// serde_json errors look like: "expected value at line 5 column 10"
pub fn extract_error_position(message: &str) -> Option<(usize, usize)> {
    lazy_static! {
        static ref POSITION_RE: Regex = Regex::new(r"at line (\d+) column (\d+)").unwrap();
    }

    let caps = POSITION_RE.captures(message)?;
    let line = caps.get(1)?.as_str().parse().ok()?;
    let column = caps.get(2)?.as_str().parse().ok()?;
    Some((line, column))
}

/// Remove the trailing "at line X column Y" from a parser error message
pub fn clean_error_message(message: &str) -> String {
    lazy_static! {
        static ref POSITION_SUFFIX_RE: Regex = Regex::new(r"\s+at line \d+ column \d+$").unwrap();
    }

    POSITION_SUFFIX_RE.replace(message, "").to_string()
}
