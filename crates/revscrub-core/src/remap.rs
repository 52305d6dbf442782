//! Line-position remapping through a batch of line edits
//!
//! Overlay markers are not part of the document, so nothing moves them when a
//! batch of edits lands. Every edit in a batch is expressed in the coordinates
//! of the document *before* the batch; `remap` measures a position against each
//! edit in those coordinates and accumulates the resulting shifts.

use serde::{Deserialize, Serialize};

/// Half-open range of 1-based lines, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "line range {start}..{end} is reversed");
        Self { start, end }
    }

    /// Range covering `count` lines starting at `start`
    pub fn with_len(start: usize, count: usize) -> Self {
        Self::new(start, start + count)
    }

    /// Empty range sitting in front of `line`
    pub fn at(line: usize) -> Self {
        Self::new(line, line)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start && line < self.end
    }

    /// True when both ranges cover at least one common line
    pub fn intersects(&self, other: &LineRange) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start < other.end
            && other.start < self.end
    }
}

/// Delete the lines in `range`, then insert `text` at `range.start`.
///
/// `text` is made of whole lines; every line but possibly the last one of the
/// file carries its `\n` terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub range: LineRange,
    pub text: String,
}

impl LineEdit {
    pub fn new(range: LineRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn delete(range: LineRange) -> Self {
        Self::new(range, String::new())
    }

    /// Insert `text` in front of `line`
    pub fn insert(line: usize, text: impl Into<String>) -> Self {
        Self::new(LineRange::at(line), text)
    }

    pub fn inserted_lines(&self) -> usize {
        self.text.split_inclusive('\n').count()
    }
}

/// Which side of an insertion a position exactly at an edit's end sticks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bias {
    /// Stay in front of the inserted lines
    Left,
    /// Move past the inserted lines
    #[default]
    Right,
}

/// Map `position` through `edits` (right bias).
///
/// Per edit: a position strictly inside the deleted range clamps to its start,
/// a position at or past the range end shifts by `inserted - deleted`, and a
/// position before the edit is left alone.
pub fn remap(position: usize, edits: &[LineEdit]) -> usize {
    remap_with(position, edits, Bias::Right)
}

pub fn remap_with(position: usize, edits: &[LineEdit], bias: Bias) -> usize {
    debug_assert!(
        edits_are_disjoint(edits),
        "remap called with overlapping edit ranges"
    );

    let original = position;
    let mut mapped = position as isize;

    for edit in edits {
        let LineRange { start, end } = edit.range;
        let removed = end - start;

        // Slide back over whatever part of the deleted range lies before us.
        mapped -= original.saturating_sub(start).min(removed) as isize;

        let past_end = match bias {
            Bias::Left => original > end,
            Bias::Right => original >= end,
        };
        if past_end {
            mapped += edit.inserted_lines() as isize;
        }
    }

    mapped.max(0) as usize
}

/// True when no two edits delete a common line
pub fn edits_are_disjoint(edits: &[LineEdit]) -> bool {
    edits.iter().enumerate().all(|(idx, edit)| {
        edits[idx + 1..]
            .iter()
            .all(|other| !edit.range.intersects(&other.range))
    })
}
