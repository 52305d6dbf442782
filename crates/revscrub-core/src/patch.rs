//! Zero-context unified diff parsing
//!
//! The input must be produced with zero lines of context (`git diff -U0`): the
//! lines following a hunk header are taken as `del_count` removed lines and then
//! `add_count` added lines, with no context lines in between.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@")
        .expect("hunk header pattern should compile")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("malformed hunk header at diff line {line}: {text}")]
    MalformedHeader { line: usize, text: String },
    #[error("hunk at diff line {line} expects {expected} content lines, found {found}")]
    Truncated {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Which way a version step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Old to new: removed lines are live, added lines are pending
    Forwards,
    /// New to old: added lines are live, removed lines are pending
    Backwards,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forwards => Direction::Backwards,
            Direction::Backwards => Direction::Forwards,
        }
    }

    /// Offset into an ordered version list
    pub fn offset(self) -> isize {
        match self {
            Direction::Forwards => 1,
            Direction::Backwards => -1,
        }
    }
}

/// One contiguous before/after change region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// 1-based line in the old text where removal starts
    pub old_pos: usize,
    pub del_count: usize,
    /// 1-based line in the new text where insertion starts
    pub new_pos: usize,
    pub add_count: usize,
    pub removed_lines: Vec<String>,
    pub added_lines: Vec<String>,
    /// Last removed line is the end of a file without a trailing newline
    #[serde(default)]
    pub old_missing_newline: bool,
    /// Last added line is the end of a file without a trailing newline
    #[serde(default)]
    pub new_missing_newline: bool,
}

impl Hunk {
    /// First line and line count of the side that is document text before the step
    pub fn live_span(&self, direction: Direction) -> (usize, usize) {
        match direction {
            Direction::Forwards => (self.old_pos, self.del_count),
            Direction::Backwards => (self.new_pos, self.add_count),
        }
    }

    /// Lines that become document text once the step is committed
    pub fn pending_lines(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Forwards => &self.added_lines,
            Direction::Backwards => &self.removed_lines,
        }
    }

    pub fn live_lines(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Forwards => &self.removed_lines,
            Direction::Backwards => &self.added_lines,
        }
    }

    pub fn live_missing_newline(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forwards => self.old_missing_newline,
            Direction::Backwards => self.new_missing_newline,
        }
    }

    pub fn pending_missing_newline(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forwards => self.new_missing_newline,
            Direction::Backwards => self.old_missing_newline,
        }
    }

    /// Live-document line after which the pending lines land (0 = file start)
    pub fn pending_anchor(&self, direction: Direction) -> usize {
        match direction {
            // old_pos already points past an empty range
            Direction::Forwards => (self.old_pos + self.del_count).saturating_sub(1),
            // an empty new range names the line before it
            Direction::Backwards if self.add_count == 0 => self.new_pos,
            Direction::Backwards => self.new_pos.saturating_sub(1),
        }
    }
}

/// Parse a zero-context unified diff, skipping anything that is not a well-formed hunk.
pub fn parse_patches(diff: &str) -> Vec<Hunk> {
    parse(diff, false).unwrap_or_default()
}

/// Like [`parse_patches`], but fails on header-looking lines that do not match
/// the hunk header grammar and on hunks cut short by the end of input.
pub fn parse_patches_strict(diff: &str) -> Result<Vec<Hunk>, PatchError> {
    parse(diff, true)
}

fn parse(diff: &str, strict: bool) -> Result<Vec<Hunk>, PatchError> {
    let mut lines: Vec<&str> = diff.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    let mut hunks = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];
        let line_number = idx + 1;
        idx += 1;

        let Some(header) = parse_header(line) else {
            if line.starts_with("@@") {
                if strict {
                    return Err(PatchError::MalformedHeader {
                        line: line_number,
                        text: line.to_string(),
                    });
                }
                log::warn!("skipping malformed hunk header at diff line {line_number}: {line}");
            }
            continue;
        };
        let (old_pos, del_count, new_pos, add_count) = header;

        let (removed_lines, old_missing_newline) = take_side(&lines, &mut idx, del_count);
        let (added_lines, new_missing_newline) = take_side(&lines, &mut idx, add_count);

        if removed_lines.len() != del_count || added_lines.len() != add_count {
            let err = PatchError::Truncated {
                line: line_number,
                expected: del_count + add_count,
                found: removed_lines.len() + added_lines.len(),
            };
            if strict {
                return Err(err);
            }
            log::warn!("skipping hunk: {err}");
            continue;
        }

        hunks.push(Hunk {
            old_pos,
            del_count,
            new_pos,
            add_count,
            removed_lines,
            added_lines,
            old_missing_newline,
            new_missing_newline,
        });
    }

    log::debug!("parsed {} hunks", hunks.len());
    Ok(hunks)
}

fn parse_header(line: &str) -> Option<(usize, usize, usize, usize)> {
    let caps = HUNK_HEADER.captures(line)?;
    let number = |idx: usize| -> Option<Option<usize>> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok().map(Some),
            None => Some(None),
        }
    };

    let mut old_pos = number(1)??;
    let del_count = number(2)?.unwrap_or(1);
    let new_pos = number(3)??;
    let add_count = number(4)?.unwrap_or(1);

    // An empty range names the line before the change.
    if del_count == 0 {
        old_pos += 1;
    }

    Some((old_pos, del_count, new_pos, add_count))
}

/// Consume up to `count` content lines, stripping the leading diff marker.
/// Stops early at the next hunk header. Returns the lines and whether a
/// "\ No newline at end of file" note followed them.
fn take_side(lines: &[&str], idx: &mut usize, count: usize) -> (Vec<String>, bool) {
    let mut taken = Vec::with_capacity(count);
    while taken.len() < count && *idx < lines.len() {
        let line = lines[*idx];
        if HUNK_HEADER.is_match(line) {
            break;
        }
        *idx += 1;
        if line.starts_with('\\') {
            continue;
        }
        taken.push(strip_marker(line).to_string());
    }

    let missing_newline =
        count > 0 && lines.get(*idx).is_some_and(|line| line.starts_with('\\'));
    if missing_newline {
        *idx += 1;
    }

    (taken, missing_newline)
}

fn strip_marker(line: &str) -> &str {
    let mut chars = line.chars();
    chars.next();
    chars.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replacement_hunk() {
        let diff = "@@ -3,2 +3,1 @@\n-two\n-three\n+TWO\n";
        let hunks = parse_patches(diff);

        assert_eq!(hunks.len(), 1);
        let hunk = &hunks[0];
        assert_eq!(hunk.old_pos, 3);
        assert_eq!(hunk.del_count, 2);
        assert_eq!(hunk.new_pos, 3);
        assert_eq!(hunk.add_count, 1);
        assert_eq!(hunk.removed_lines, vec!["two", "three"]);
        assert_eq!(hunk.added_lines, vec!["TWO"]);
    }

    #[test]
    fn test_missing_counts_default_to_one() {
        let hunks = parse_patches("@@ -7 +7 @@\n-old\n+new\n");
        assert_eq!(hunks[0].del_count, 1);
        assert_eq!(hunks[0].add_count, 1);
        assert_eq!(hunks[0].old_pos, 7);
    }

    #[test]
    fn test_empty_old_range_points_after_line() {
        let hunks = parse_patches("@@ -4,0 +5,2 @@\n+a\n+b\n");
        assert_eq!(hunks[0].old_pos, 5);
        assert_eq!(hunks[0].del_count, 0);
        assert_eq!(hunks[0].pending_anchor(Direction::Forwards), 4);

        let at_start = parse_patches("@@ -0,0 +1,2 @@\n+a\n+b\n");
        assert_eq!(at_start[0].old_pos, 1);
        assert_eq!(at_start[0].pending_anchor(Direction::Forwards), 0);
    }

    #[test]
    fn test_backwards_anchor_for_empty_new_range() {
        // Lines 5-6 removed; going back they re-appear after new line 4.
        let hunks = parse_patches("@@ -5,2 +4,0 @@\n-e\n-f\n");
        assert_eq!(hunks[0].pending_anchor(Direction::Backwards), 4);
        assert_eq!(hunks[0].live_span(Direction::Backwards), (4, 0));

        let hunks = parse_patches("@@ -2 +2,2 @@\n-b\n+x\n+y\n");
        assert_eq!(hunks[0].pending_anchor(Direction::Backwards), 1);
        assert_eq!(hunks[0].pending_lines(Direction::Backwards), ["b".to_string()]);
    }

    #[test]
    fn test_skips_git_preamble_and_keeps_order() {
        let diff = "diff --git a/f.py b/f.py\n\
                    index 3b18e51..a2b7c6d 100644\n\
                    --- a/f.py\n\
                    +++ b/f.py\n\
                    @@ -1 +1 @@\n\
                    -a\n\
                    +A\n\
                    @@ -9,0 +10 @@\n\
                    +tail\n";
        let hunks = parse_patches(diff);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].old_pos, 1);
        assert_eq!(hunks[1].old_pos, 10);
        assert_eq!(hunks[1].added_lines, vec!["tail"]);
    }

    #[test]
    fn test_content_lines_are_not_read_as_headers() {
        let diff = "@@ -1 +1 @@\n-@@ -5 +5 @@\n+plain\n";
        let hunks = parse_patches(diff);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].removed_lines, vec!["@@ -5 +5 @@"]);
    }

    #[test]
    fn test_no_newline_markers() {
        let diff = "@@ -2 +2,2 @@\n-last\n\\ No newline at end of file\n+last\n+more\n\\ No newline at end of file\n";
        let hunks = parse_patches(diff);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].removed_lines, vec!["last"]);
        assert_eq!(hunks[0].added_lines, vec!["last", "more"]);
        assert!(hunks[0].old_missing_newline);
        assert!(hunks[0].new_missing_newline);
    }

    #[test]
    fn test_lenient_skips_malformed_header() {
        let diff = "@@ -x +1 @@\n@@ -2 +2 @@\n-b\n+B\n";
        let hunks = parse_patches(diff);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].old_pos, 2);
    }

    #[test]
    fn test_strict_reports_malformed_header() {
        let err = parse_patches_strict("@@ -1 +1 @@\n-a\n+b\n@@ bogus @@\n").unwrap_err();
        assert_eq!(
            err,
            PatchError::MalformedHeader {
                line: 4,
                text: "@@ bogus @@".to_string()
            }
        );
    }

    #[test]
    fn test_truncated_hunk() {
        let diff = "@@ -1,3 +1 @@\n-a\n-b\n";
        assert!(parse_patches(diff).is_empty());
        assert!(matches!(
            parse_patches_strict(diff),
            Err(PatchError::Truncated {
                line: 1,
                expected: 4,
                found: 2
            })
        ));
    }

    #[test]
    fn test_short_hunk_does_not_swallow_next_header() {
        let diff = "@@ -1,2 +1 @@\n-a\n@@ -5 +4 @@\n-e\n+E\n";
        let hunks = parse_patches(diff);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].old_pos, 5);
        assert_eq!(hunks[0].removed_lines, vec!["e"]);
        assert_eq!(hunks[0].added_lines, vec!["E"]);

        assert!(matches!(
            parse_patches_strict(diff),
            Err(PatchError::Truncated {
                line: 1,
                expected: 3,
                found: 1
            })
        ));
    }

    #[test]
    fn test_hunk_json_shape() {
        let hunks = parse_patches("@@ -1 +1 @@\n-a\n+b\n");
        let json = serde_json::to_value(&hunks[0]).unwrap();
        assert_eq!(json["old_pos"], 1);
        assert_eq!(json["removed_lines"][0], "a");
        assert_eq!(json["added_lines"][0], "b");
        assert_eq!(json["new_missing_newline"], false);
    }

    #[test]
    fn test_crlf_content_is_preserved() {
        let hunks = parse_patches("@@ -1 +1 @@\n-a\r\n+b\r\n");
        assert_eq!(hunks[0].removed_lines, vec!["a\r"]);
        assert_eq!(hunks[0].added_lines, vec!["b\r"]);
    }
}
