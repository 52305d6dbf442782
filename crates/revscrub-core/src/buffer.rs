//! In-memory text surface
//!
//! Stores the document as lines that keep their `\n` terminators, so
//! `full_text` reproduces the input byte for byte. Regions and zones are kept
//! beside the text and relocated through every edit batch. [`Buffer::layout`]
//! flattens document lines and floating zones into display rows.

use crate::remap::{remap, remap_with, Bias, LineEdit, LineRange};
use crate::surface::{
    MarkerClass, OverlayConfig, Region, RegionId, RegionSetId, TextSurface, ZoneId, ZoneSpec,
};
use rustc_hash::FxHashMap;

/// Overlay styling attached to a display row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    pub class: MarkerClass,
    /// 0.0 invisible, 1.0 full strength
    pub intensity: f32,
    /// Row belongs to a floating zone rather than the document
    pub floating: bool,
}

/// One display row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Document line number; `None` for zone rows
    pub number: Option<usize>,
    pub text: String,
    pub mark: Option<Mark>,
}

#[derive(Debug, Clone)]
struct Zone {
    spec: ZoneSpec,
    language: Option<String>,
}

#[derive(Debug, Default)]
pub struct Buffer {
    lines: Vec<String>,
    undo: Vec<Vec<String>>,
    sets: FxHashMap<RegionSetId, Vec<RegionId>>,
    regions: FxHashMap<RegionId, Region>,
    zones: FxHashMap<ZoneId, Zone>,
    next_id: u64,
}

fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(String::from).collect()
}

fn display_line(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

impl Buffer {
    pub fn new(text: &str) -> Self {
        Self {
            lines: split_lines(text),
            ..Self::default()
        }
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Revert the last edit batch. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo.pop() {
            Some(lines) => {
                self.lines = lines;
                true
            }
            None => false,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn zone(&self, id: ZoneId) -> Option<&ZoneSpec> {
        self.zones.get(&id).map(|zone| &zone.spec)
    }

    pub fn zone_language(&self, id: ZoneId) -> Option<&str> {
        self.zones.get(&id)?.language.as_deref()
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Document lines interleaved with zone rows, top to bottom
    pub fn layout(&self) -> Vec<Row> {
        let mut zones: Vec<(&ZoneId, &Zone)> = self.zones.iter().collect();
        zones.sort_by_key(|(id, zone)| (zone.spec.after_line, **id));
        let mut zones = zones.into_iter().peekable();

        let mut rows = Vec::with_capacity(self.lines.len());
        for line in 0..=self.lines.len() {
            if line > 0 {
                rows.push(Row {
                    number: Some(line),
                    text: display_line(&self.lines[line - 1]).to_string(),
                    mark: self.line_mark(line),
                });
            }
            while let Some((_, zone)) = zones.next_if(|(_, z)| z.spec.after_line <= line) {
                push_zone_rows(&mut rows, &zone.spec);
            }
        }
        // Zones anchored past the end of the document
        for (_, zone) in zones {
            push_zone_rows(&mut rows, &zone.spec);
        }
        rows
    }

    fn line_mark(&self, line: usize) -> Option<Mark> {
        self.regions
            .values()
            .filter(|region| region.lines.contains(line) && region.opacity > 0.0)
            .max_by(|a, b| a.opacity.total_cmp(&b.opacity))
            .map(|region| Mark {
                class: region.class,
                intensity: region.opacity.min(1.0),
                floating: false,
            })
    }
}

fn push_zone_rows(rows: &mut Vec<Row>, spec: &ZoneSpec) {
    let count = spec.height.max(0.0).round() as usize;
    if count == 0 {
        return;
    }
    let text_lines: Vec<&str> = spec.text.split('\n').collect();
    let intensity = (spec.height / text_lines.len() as f32).clamp(0.0, 1.0);
    for idx in 0..count {
        rows.push(Row {
            number: None,
            text: text_lines
                .get(idx)
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .unwrap_or_default(),
            mark: Some(Mark {
                class: spec.class,
                intensity,
                floating: true,
            }),
        });
    }
}

impl TextSurface for Buffer {
    fn full_text(&self) -> String {
        self.lines.concat()
    }

    fn set_full_text(&mut self, text: &str) {
        self.lines = split_lines(text);
        self.undo.clear();
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn text_in_range(&self, range: LineRange) -> String {
        let start = range.start.saturating_sub(1).min(self.lines.len());
        let end = range.end.saturating_sub(1).clamp(start, self.lines.len());
        self.lines[start..end].concat()
    }

    fn apply_edits(&mut self, edits: &[LineEdit]) {
        if edits.is_empty() {
            return;
        }
        self.undo.push(self.lines.clone());

        let mut ordered: Vec<&LineEdit> = edits.iter().collect();
        ordered.sort_by(|a, b| {
            (b.range.start, b.range.end).cmp(&(a.range.start, a.range.end))
        });
        for edit in ordered {
            let start = edit.range.start.saturating_sub(1).min(self.lines.len());
            let end = edit.range.end.saturating_sub(1).clamp(start, self.lines.len());
            self.lines.splice(start..end, split_lines(&edit.text));
        }

        // Text spliced after an unterminated line must start on a line of its own.
        let last = self.lines.len().saturating_sub(1);
        for line in &mut self.lines[..last] {
            if !line.ends_with('\n') {
                line.push('\n');
            }
        }

        self.regions.retain(|_, region| {
            let start = remap(region.lines.start, edits);
            let end = remap_with(region.lines.end, edits, Bias::Left);
            region.lines = LineRange::new(start, end.max(start));
            !region.lines.is_empty()
        });
        for ids in self.sets.values_mut() {
            ids.retain(|id| self.regions.contains_key(id));
        }
        for zone in self.zones.values_mut() {
            let below = remap_with(zone.spec.after_line + 1, edits, Bias::Left);
            zone.spec.after_line = below.saturating_sub(1);
        }
    }

    fn reset_undo_history(&mut self) {
        self.undo.clear();
    }

    fn create_region_set(&mut self) -> RegionSetId {
        let id = RegionSetId(self.fresh_id());
        self.sets.insert(id, Vec::new());
        id
    }

    fn add_region(&mut self, set: RegionSetId, region: Region, _config: &OverlayConfig) -> RegionId {
        let id = RegionId(self.fresh_id());
        self.sets.entry(set).or_default().push(id);
        self.regions.insert(id, region);
        id
    }

    fn remove_region(&mut self, id: RegionId) {
        if self.regions.remove(&id).is_some() {
            for ids in self.sets.values_mut() {
                ids.retain(|other| *other != id);
            }
        }
    }

    fn clear_regions(&mut self, set: RegionSetId) {
        if let Some(ids) = self.sets.get_mut(&set) {
            for id in ids.drain(..) {
                self.regions.remove(&id);
            }
        }
    }

    fn has_region(&self, id: RegionId) -> bool {
        self.regions.contains_key(&id)
    }

    fn region(&self, id: RegionId) -> Option<Region> {
        self.regions.get(&id).cloned()
    }

    fn regions(&self, set: RegionSetId) -> Vec<(RegionId, Region)> {
        self.sets
            .get(&set)
            .into_iter()
            .flatten()
            .filter_map(|id| Some((*id, self.regions.get(id)?.clone())))
            .collect()
    }

    fn set_region_opacity(&mut self, id: RegionId, opacity: f32) {
        if let Some(region) = self.regions.get_mut(&id) {
            region.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn create_zone(&mut self, spec: ZoneSpec, config: &OverlayConfig) -> ZoneId {
        let id = ZoneId(self.fresh_id());
        self.zones.insert(
            id,
            Zone {
                spec,
                language: config.language.clone(),
            },
        );
        id
    }

    fn relayout_zone(&mut self, id: ZoneId, height: f32) {
        if let Some(zone) = self.zones.get_mut(&id) {
            zone.spec.height = height.max(0.0);
        }
    }

    fn destroy_zone(&mut self, id: ZoneId) {
        self.zones.remove(&id);
    }

    fn has_zone(&self, id: ZoneId) -> bool {
        self.zones.contains_key(&id)
    }

    fn zone_text(&self, id: ZoneId) -> Option<String> {
        self.zones.get(&id).map(|zone| zone.spec.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(start: usize, end: usize) -> Region {
        Region {
            lines: LineRange::new(start, end),
            class: MarkerClass::Deleted,
            opacity: 1.0,
        }
    }

    fn zone(after_line: usize, height: f32, text: &str) -> ZoneSpec {
        ZoneSpec {
            after_line,
            height,
            text: text.to_string(),
            class: MarkerClass::Added,
        }
    }

    #[test]
    fn test_full_text_round_trips_without_trailing_newline() {
        let buf = Buffer::new("a\nb\nc");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.full_text(), "a\nb\nc");
        assert_eq!(buf.text_in_range(LineRange::new(2, 4)), "b\nc");
        assert_eq!(buf.text_in_range(LineRange::new(9, 12)), "");
    }

    #[test]
    fn test_apply_edits_uses_pre_batch_coordinates() {
        let mut buf = Buffer::new("1\n2\n3\n4\n5\n");
        buf.apply_edits(&[
            LineEdit::delete(LineRange::new(2, 3)),
            LineEdit::insert(4, "x\ny\n"),
            LineEdit::new(LineRange::new(5, 6), "five\n"),
        ]);
        assert_eq!(buf.full_text(), "1\n3\nx\ny\n4\nfive\n");
    }

    #[test]
    fn test_delete_and_insert_at_same_line() {
        let mut buf = Buffer::new("a\nb\nc\n");
        buf.apply_edits(&[
            LineEdit::insert(2, "B\n"),
            LineEdit::delete(LineRange::new(2, 3)),
        ]);
        assert_eq!(buf.full_text(), "a\nB\nc\n");
    }

    #[test]
    fn test_insert_after_unterminated_last_line() {
        let mut buf = Buffer::new("a\nb");
        buf.apply_edits(&[LineEdit::insert(3, "c")]);
        assert_eq!(buf.full_text(), "a\nb\nc");
    }

    #[test]
    fn test_undo_and_reset() {
        let mut buf = Buffer::new("a\nb\n");
        buf.apply_edits(&[LineEdit::delete(LineRange::new(1, 2))]);
        assert_eq!(buf.undo_depth(), 1);
        assert!(buf.undo());
        assert_eq!(buf.full_text(), "a\nb\n");

        buf.apply_edits(&[LineEdit::delete(LineRange::new(1, 2))]);
        buf.reset_undo_history();
        assert!(!buf.undo());
        assert_eq!(buf.full_text(), "b\n");
    }

    #[test]
    fn test_regions_follow_edits_and_drop_when_deleted() {
        let config = OverlayConfig::default();
        let mut buf = Buffer::new("1\n2\n3\n4\n5\n6\n");
        let set = buf.create_region_set();
        let kept = buf.add_region(set, region(5, 7), &config);
        let gone = buf.add_region(set, region(2, 3), &config);

        buf.apply_edits(&[
            LineEdit::delete(LineRange::new(1, 3)),
            LineEdit::insert(5, "x\n"),
        ]);

        assert!(!buf.has_region(gone));
        assert_eq!(buf.region(kept).map(|r| r.lines), Some(LineRange::new(4, 6)));
        assert_eq!(buf.regions(set).len(), 1);
    }

    #[test]
    fn test_clear_and_remove_regions() {
        let config = OverlayConfig::default();
        let mut buf = Buffer::new("a\nb\nc\n");
        let first = buf.create_region_set();
        let second = buf.create_region_set();
        let a = buf.add_region(first, region(1, 2), &config);
        let b = buf.add_region(second, region(2, 3), &config);
        let c = buf.add_region(second, region(3, 4), &config);

        buf.clear_regions(first);
        assert!(!buf.has_region(a));
        buf.remove_region(b);
        assert_eq!(buf.regions(second).iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![c]);
    }

    #[test]
    fn test_layout_interleaves_zones() {
        let config = OverlayConfig {
            language: Some("rust".to_string()),
            ..OverlayConfig::default()
        };
        let mut buf = Buffer::new("a\nb\n");
        let top = buf.create_zone(zone(0, 1.0, "top"), &config);
        buf.create_zone(zone(1, 2.0, "x\ny"), &config);
        buf.create_zone(zone(2, 0.4, "hidden"), &config);
        let set = buf.create_region_set();
        buf.add_region(set, region(2, 3), &config);

        let rows = buf.layout();
        let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["top", "a", "x", "y", "b"]);
        assert_eq!(rows[1].number, Some(1));
        assert_eq!(rows[2].number, None);
        assert!(rows[2].mark.is_some_and(|m| m.floating));
        assert_eq!(rows[4].mark.map(|m| m.class), Some(MarkerClass::Deleted));
        assert_eq!(buf.zone_language(top), Some("rust"));
    }

    #[test]
    fn test_zones_follow_edits() {
        let config = OverlayConfig::default();
        let mut buf = Buffer::new("1\n2\n3\n4\n5\n");
        let id = buf.create_zone(zone(4, 1.0, "z"), &config);
        buf.apply_edits(&[LineEdit::delete(LineRange::new(1, 3))]);
        assert_eq!(buf.zone(id).map(|z| z.after_line), Some(2));

        buf.relayout_zone(id, 0.5);
        assert_eq!(buf.zone(id).map(|z| z.height), Some(0.5));
        buf.destroy_zone(id);
        assert!(!buf.has_zone(id));
        assert_eq!(buf.zone_text(id), None);
    }
}
