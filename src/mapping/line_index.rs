//! Byte offset to line/column conversion

/// Zero-based line and UTF-16 column, as editors expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Line start table for one text snapshot
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    /// Convert a byte offset; offsets past the end clamp to the end and
    /// offsets inside a multi-byte character snap back to its start.
    pub fn line_col(&self, offset: usize) -> LineCol {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let col = self.text[self.line_starts[line]..offset].encode_utf16().count();

        LineCol {
            line: line as u32,
            col: col as u32,
        }
    }

    /// Convert a 1-based line and byte column, as `serde_json` reports them,
    /// back into a byte offset
    pub fn offset_of(&self, line: usize, column: usize) -> usize {
        let Some(&start) = self.line_starts.get(line.saturating_sub(1)) else {
            return self.text.len();
        };
        (start + column.saturating_sub(1)).min(self.text.len())
    }
}
