//! Correlated ranges between original and cleaned text
//!
//! A [`SourceMap`] is an ordered list of [`Segment`]s. Original ranges
//! partition the original document and cleaned ranges partition the
//! neutralized document, so any cleaned offset can be projected back.

use std::ops::Range;

use crate::parser::PlaceholderKind;

/// What produced a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Text copied verbatim; both ranges have the same length
    Text,
    /// A placeholder tag replaced by synthesized text (possibly empty)
    Placeholder(PlaceholderKind),
    /// A separator removed while repairing the neutralized text
    Repair,
}

/// A correlated range pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub original: Range<usize>,
    pub cleaned: Range<usize>,
    /// Text emitted in place of a placeholder
    pub replacement: Option<String>,
}

impl Segment {
    pub fn text(original: Range<usize>, cleaned_start: usize) -> Self {
        let len = original.len();
        Self {
            kind: SegmentKind::Text,
            original,
            cleaned: cleaned_start..cleaned_start + len,
            replacement: None,
        }
    }

    pub fn placeholder(
        kind: PlaceholderKind,
        original: Range<usize>,
        cleaned_start: usize,
        replacement: String,
    ) -> Self {
        Self {
            kind: SegmentKind::Placeholder(kind),
            original,
            cleaned: cleaned_start..cleaned_start + replacement.len(),
            replacement: Some(replacement),
        }
    }

    pub fn repair(original: Range<usize>, cleaned_start: usize) -> Self {
        Self {
            kind: SegmentKind::Repair,
            original,
            cleaned: cleaned_start..cleaned_start,
            replacement: None,
        }
    }

    /// Whether this segment stands for a synthesized sample value
    pub fn is_synthesized(&self) -> bool {
        matches!(self.kind, SegmentKind::Placeholder(_))
            && self.replacement.as_deref().is_some_and(|r| !r.is_empty())
    }

    fn cleaned_len_for(&self, original_len: usize) -> usize {
        match self.kind {
            SegmentKind::Text => original_len,
            SegmentKind::Placeholder(_) => self.replacement.as_ref().map_or(0, String::len),
            SegmentKind::Repair => 0,
        }
    }
}

/// Offset mapping from neutralized text back to the original document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMap {
    segments: Vec<Segment>,
}

impl SourceMap {
    /// Build a map from segments already in document order
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// A single text segment covering `len` bytes
    pub fn identity(len: usize) -> Self {
        Self::new(vec![Segment::text(0..len, 0)])
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Map a cleaned-text offset to an original-text offset.
    ///
    /// Offsets inside synthesized text collapse to the start of the
    /// placeholder tag. Offsets past every segment fall back to the end of
    /// the nearest preceding segment.
    pub fn to_original(&self, offset: usize) -> usize {
        // Segments with `cleaned.start <= offset` form a prefix.
        let upper = self.segments.partition_point(|s| s.cleaned.start <= offset);
        let preceding = &self.segments[..upper];

        // Empty segments never contain an offset; the nearest non-empty one
        // before the boundary does, if any.
        if let Some(segment) = preceding.iter().rev().find(|s| offset < s.cleaned.end) {
            return match segment.kind {
                SegmentKind::Text => segment.original.start + (offset - segment.cleaned.start),
                SegmentKind::Placeholder(_) | SegmentKind::Repair => segment.original.start,
            };
        }

        match preceding.last() {
            Some(segment) => segment.original.end,
            None => 0,
        }
    }

    /// Map an exclusive end offset through the byte before it, so the end
    /// stops at that byte instead of running over elided tags or removed
    /// separators that follow.
    fn to_original_end(&self, offset: usize) -> usize {
        let Some(last) = offset.checked_sub(1) else {
            return self.to_original(offset);
        };

        let upper = self.segments.partition_point(|s| s.cleaned.start <= last);
        match self.segments[..upper].iter().rev().find(|s| last < s.cleaned.end) {
            Some(segment) => match segment.kind {
                SegmentKind::Text => segment.original.start + (offset - segment.cleaned.start),
                SegmentKind::Placeholder(_) | SegmentKind::Repair => segment.original.end,
            },
            None => self.to_original(offset),
        }
    }

    /// Map a cleaned-text range. The start maps forward and the end maps
    /// backward, so a non-empty range covers exactly the original text
    /// that produced it.
    pub fn to_original_range(&self, range: Range<usize>) -> Range<usize> {
        let start = self.to_original(range.start);
        if range.is_empty() {
            return start..start;
        }
        let end = self.to_original_end(range.end).max(start);
        start..end
    }

    /// Whether `range` (cleaned coordinates) touches synthesized sample text
    pub fn overlaps_synthesized(&self, range: &Range<usize>) -> bool {
        self.segments.iter().any(|s| {
            s.is_synthesized() && s.cleaned.start < range.end && range.start < s.cleaned.end
        })
    }

    /// Remove single-byte separators at the given cleaned offsets.
    ///
    /// Each removal splits its text segment around a [`SegmentKind::Repair`]
    /// segment and every cleaned range is recomputed, so mapping stays exact
    /// after the cleaned text shrinks. Offsets outside text segments are
    /// ignored. `removed` must be sorted.
    pub fn elide_cleaned_bytes(&self, removed: &[usize]) -> SourceMap {
        let mut pieces = Vec::with_capacity(self.segments.len() + removed.len() * 2);

        for segment in &self.segments {
            if segment.kind != SegmentKind::Text {
                pieces.push(segment.clone());
                continue;
            }

            let mut original_cursor = segment.original.start;
            let lo = removed.partition_point(|&r| r < segment.cleaned.start);
            let hi = removed.partition_point(|&r| r < segment.cleaned.end);
            for &cleaned_offset in &removed[lo..hi] {
                let at = segment.original.start + (cleaned_offset - segment.cleaned.start);
                if at > original_cursor {
                    pieces.push(Segment::text(original_cursor..at, 0));
                }
                pieces.push(Segment::repair(at..at + 1, 0));
                original_cursor = at + 1;
            }
            if original_cursor < segment.original.end || pieces.is_empty() {
                pieces.push(Segment::text(original_cursor..segment.original.end, 0));
            }
        }

        let mut cleaned_cursor = 0;
        for piece in &mut pieces {
            let len = piece.cleaned_len_for(piece.original.len());
            piece.cleaned = cleaned_cursor..cleaned_cursor + len;
            cleaned_cursor += len;
        }

        SourceMap::new(pieces)
    }

    /// Check the partition invariants against both texts
    pub fn is_consistent(&self, original_len: usize, cleaned_len: usize) -> bool {
        let mut original_cursor = 0;
        let mut cleaned_cursor = 0;
        for segment in &self.segments {
            if segment.original.start != original_cursor
                || segment.cleaned.start != cleaned_cursor
                || segment.cleaned.len() != segment.cleaned_len_for(segment.original.len())
            {
                return false;
            }
            original_cursor = segment.original.end;
            cleaned_cursor = segment.cleaned.end;
        }
        original_cursor == original_len && cleaned_cursor == cleaned_len
    }
}
