//! Position mapping between neutralized and original text

mod line_index;
mod segments;

pub use line_index::{LineCol, LineIndex};
pub use segments::{Segment, SegmentKind, SourceMap};
