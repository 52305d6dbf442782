//! Marker records derived from a hunk set
//!
//! A [`MarkerSet`] is an immutable value: direction swaps and relocation
//! through an edit batch produce a new set instead of flipping fields in place.

use crate::patch::{Direction, Hunk};
use crate::remap::{remap_with, Bias, LineEdit, LineRange};
use crate::surface::MarkerClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Marks existing lines that the step removes
    Region,
    /// Floats under a line and holds lines the step inserts
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    /// First marked line for a region, the line it floats under for a placeholder
    pub anchor: usize,
    /// Full height in lines
    pub height: usize,
    /// Exact text including line terminators
    pub text: String,
    pub class: MarkerClass,
}

impl Marker {
    pub fn region(anchor: usize, text: String, class: MarkerClass) -> Self {
        let height = text.split_inclusive('\n').count();
        Self {
            kind: MarkerKind::Region,
            anchor,
            height,
            text,
            class,
        }
    }

    pub fn placeholder(anchor: usize, text: String, class: MarkerClass) -> Self {
        let height = text.split_inclusive('\n').count();
        Self {
            kind: MarkerKind::Placeholder,
            anchor,
            height,
            text,
            class,
        }
    }

    pub fn is_region(&self) -> bool {
        self.kind == MarkerKind::Region
    }

    /// Lines covered by a region; empty for placeholders
    pub fn lines(&self) -> LineRange {
        match self.kind {
            MarkerKind::Region => LineRange::with_len(self.anchor, self.height),
            MarkerKind::Placeholder => LineRange::at(self.anchor + 1),
        }
    }

    /// Text without the final terminator, as shown in a floating zone
    pub fn display_text(&self) -> &str {
        self.text.strip_suffix('\n').unwrap_or(&self.text)
    }

    /// True when the text ends with a line terminator
    pub fn is_terminated(&self) -> bool {
        self.text.ends_with('\n')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    pub direction: Direction,
    markers: Vec<Marker>,
}

fn join_lines(lines: &[String], missing_newline: bool) -> String {
    let mut text: String = lines.iter().map(|line| format!("{line}\n")).collect();
    if missing_newline {
        text.pop();
    }
    text
}

fn region_class(direction: Direction) -> MarkerClass {
    match direction {
        Direction::Forwards => MarkerClass::Deleted,
        Direction::Backwards => MarkerClass::Added,
    }
}

impl MarkerSet {
    pub fn new(direction: Direction, markers: Vec<Marker>) -> Self {
        Self { direction, markers }
    }

    /// One region per hunk with live lines, one placeholder per hunk with pending lines
    pub fn from_hunks(hunks: &[Hunk], direction: Direction) -> Self {
        let live_class = region_class(direction);
        let pending_class = region_class(direction.reversed());
        let mut markers = Vec::new();

        for hunk in hunks {
            let (start, count) = hunk.live_span(direction);
            if count > 0 {
                let text = join_lines(hunk.live_lines(direction), hunk.live_missing_newline(direction));
                markers.push(Marker::region(start, text, live_class));
            }

            let pending = hunk.pending_lines(direction);
            if !pending.is_empty() {
                let text = join_lines(pending, hunk.pending_missing_newline(direction));
                markers.push(Marker::placeholder(hunk.pending_anchor(direction), text, pending_class));
            }
        }

        let set = Self::new(direction, markers);
        debug_assert!(set.regions_are_disjoint(), "hunks produced overlapping regions");
        set
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn regions(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| m.kind == MarkerKind::Region)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| m.kind == MarkerKind::Placeholder)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn regions_are_disjoint(&self) -> bool {
        let regions: Vec<LineRange> = self.regions().map(Marker::lines).collect();
        regions.iter().enumerate().all(|(idx, range)| {
            regions[idx + 1..].iter().all(|other| !range.intersects(other))
        })
    }

    /// Mirror the set: a region over line `L` becomes a placeholder under `L - 1`
    /// and a placeholder under `A` becomes a region starting at `A + 1`.
    /// Classes and text are kept.
    pub fn swap_direction(self) -> Self {
        let markers = self
            .markers
            .into_iter()
            .map(|marker| match marker.kind {
                MarkerKind::Region => Marker {
                    kind: MarkerKind::Placeholder,
                    anchor: marker.anchor.saturating_sub(1),
                    ..marker
                },
                MarkerKind::Placeholder => Marker {
                    kind: MarkerKind::Region,
                    anchor: marker.anchor + 1,
                    ..marker
                },
            })
            .collect();
        Self::new(self.direction.reversed(), markers)
    }

    /// Move every anchor through an edit batch. Positions sitting exactly at an
    /// edit's end stay in front of that edit's inserted lines, which is where a
    /// region over freshly inserted text starts.
    pub fn relocate(self, edits: &[LineEdit]) -> Self {
        let markers = self
            .markers
            .into_iter()
            .map(|marker| {
                let anchor = match marker.kind {
                    MarkerKind::Region => remap_with(marker.anchor, edits, Bias::Left),
                    MarkerKind::Placeholder => {
                        remap_with(marker.anchor + 1, edits, Bias::Left).saturating_sub(1)
                    }
                };
                Marker { anchor, ..marker }
            })
            .collect();
        Self::new(self.direction, markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::parse_patches;

    #[test]
    fn test_additions_only_produce_placeholders() {
        let hunks = parse_patches("@@ -2,0 +3,2 @@\n+x\n+y\n@@ -5,0 +8 @@\n+z\n");
        let set = MarkerSet::from_hunks(&hunks, Direction::Forwards);

        assert_eq!(set.regions().count(), 0);
        let placeholders: Vec<&Marker> = set.placeholders().collect();
        assert_eq!(placeholders.len(), 2);
        assert_eq!(placeholders[0].anchor, 2);
        assert_eq!(placeholders[0].height, 2);
        assert_eq!(placeholders[0].text, "x\ny\n");
        assert_eq!(placeholders[0].class, MarkerClass::Added);
        assert_eq!(placeholders[1].anchor, 5);
    }

    #[test]
    fn test_backwards_mirrors_classes() {
        let hunks = parse_patches("@@ -3,2 +3 @@\n-c\n-d\n+X\n");

        let forwards = MarkerSet::from_hunks(&hunks, Direction::Forwards);
        let region = forwards.regions().next().cloned();
        assert_eq!(
            region,
            Some(Marker::region(3, "c\nd\n".to_string(), MarkerClass::Deleted))
        );

        let backwards = MarkerSet::from_hunks(&hunks, Direction::Backwards);
        let region = backwards.regions().next().cloned();
        let placeholder = backwards.placeholders().next().cloned();
        assert_eq!(
            region,
            Some(Marker::region(3, "X\n".to_string(), MarkerClass::Added))
        );
        assert_eq!(
            placeholder,
            Some(Marker::placeholder(2, "c\nd\n".to_string(), MarkerClass::Deleted))
        );
    }

    #[test]
    fn test_missing_newline_leaves_text_unterminated() {
        let hunks = parse_patches("@@ -2 +2,2 @@\n-b\n\\ No newline at end of file\n+b\n+c\n\\ No newline at end of file\n");
        let set = MarkerSet::from_hunks(&hunks, Direction::Forwards);
        let placeholder = set.placeholders().next().cloned();
        let placeholder = placeholder.unwrap();
        assert_eq!(placeholder.text, "b\nc");
        assert!(!placeholder.is_terminated());
        assert_eq!(placeholder.height, 2);
        assert_eq!(placeholder.display_text(), "b\nc");
    }

    #[test]
    fn test_swap_direction() {
        let set = MarkerSet::new(
            Direction::Forwards,
            vec![
                Marker::region(3, "c\n".to_string(), MarkerClass::Deleted),
                Marker::placeholder(4, "X\n".to_string(), MarkerClass::Added),
            ],
        );
        let swapped = set.swap_direction();

        assert_eq!(swapped.direction, Direction::Backwards);
        let markers: Vec<(MarkerKind, usize, MarkerClass)> =
            swapped.iter().map(|m| (m.kind, m.anchor, m.class)).collect();
        assert_eq!(
            markers,
            vec![
                (MarkerKind::Placeholder, 2, MarkerClass::Deleted),
                (MarkerKind::Region, 5, MarkerClass::Added),
            ]
        );
    }

    #[test]
    fn test_relocate_after_commit_edits() {
        // "a b c d e" -> "a b X e": c,d deleted, X inserted in front of e.
        let edits = [
            LineEdit::delete(LineRange::new(3, 5)),
            LineEdit::insert(5, "X\n"),
        ];
        let set = MarkerSet::new(
            Direction::Forwards,
            vec![
                Marker::region(3, "c\nd\n".to_string(), MarkerClass::Deleted),
                Marker::placeholder(4, "X\n".to_string(), MarkerClass::Added),
            ],
        );

        let ghosts = set.swap_direction().relocate(&edits);
        let placeholder = ghosts.placeholders().next().map(|m| m.anchor);
        let region = ghosts.regions().next().map(Marker::lines);
        assert_eq!(placeholder, Some(2));
        assert_eq!(region, Some(LineRange::new(3, 4)));
    }

    #[test]
    fn test_relocate_pure_insertion_region() {
        let edits = [LineEdit::insert(5, "n\nm\n")];
        let set = MarkerSet::new(
            Direction::Backwards,
            vec![Marker::region(5, "n\nm\n".to_string(), MarkerClass::Added)],
        );
        let relocated = set.relocate(&edits);
        assert_eq!(relocated.regions().next().map(|m| m.anchor), Some(5));
    }

    #[test]
    fn test_regions_are_disjoint() {
        let hunks = parse_patches("@@ -1 +1 @@\n-a\n+A\n@@ -3,2 +3 @@\n-c\n-d\n+X\n");
        let set = MarkerSet::from_hunks(&hunks, Direction::Forwards);
        assert!(set.regions_are_disjoint());
        assert_eq!(set.len(), 4);
    }
}
