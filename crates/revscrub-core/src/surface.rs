//! Capability contract of the text-editing surface the overlay is drawn on

use crate::remap::{LineEdit, LineRange};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Semantic class of a marker, used for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerClass {
    Added,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionSetId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub u64);

/// A mark over existing document lines
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub lines: LineRange,
    pub class: MarkerClass,
    /// 0.0 transparent, 1.0 fully visible
    pub opacity: f32,
}

/// A floating block of text between two document lines
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSpec {
    /// Document line the zone sits under (0 = above the first line)
    pub after_line: usize,
    /// Height in lines; fractional mid-animation
    pub height: f32,
    /// Display text, one line per row
    pub text: String,
    pub class: MarkerClass,
}

/// Read-only settings handed to every marker-rendering call
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub frames_per_second: u32,
    pub transition: Duration,
    /// Minimum spacing between two accepted navigation steps
    pub cooldown: Duration,
    /// Language hint for floating zone content
    pub language: Option<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 60,
            transition: Duration::from_millis(200),
            cooldown: Duration::from_millis(100),
            language: None,
        }
    }
}

/// What the overlay engine needs from a text-editing surface.
///
/// Line numbers are 1-based. Regions follow the document through
/// [`TextSurface::apply_edits`]; an edit that deletes every line of a region
/// removes it. Region and zone ids are never reused.
pub trait TextSurface {
    fn full_text(&self) -> String;
    /// Replace the whole document; also drops undo history.
    fn set_full_text(&mut self, text: &str);
    fn line_count(&self) -> usize;
    /// Text of `range` including line terminators
    fn text_in_range(&self, range: LineRange) -> String;
    /// Apply a batch of disjoint edits, all in pre-batch coordinates, as one step.
    fn apply_edits(&mut self, edits: &[LineEdit]);
    fn reset_undo_history(&mut self);

    fn create_region_set(&mut self) -> RegionSetId;
    fn add_region(&mut self, set: RegionSetId, region: Region, config: &OverlayConfig) -> RegionId;
    fn remove_region(&mut self, id: RegionId);
    fn clear_regions(&mut self, set: RegionSetId);
    fn has_region(&self, id: RegionId) -> bool;
    /// Current state of a region, in current document coordinates
    fn region(&self, id: RegionId) -> Option<Region>;
    fn regions(&self, set: RegionSetId) -> Vec<(RegionId, Region)>;
    fn set_region_opacity(&mut self, id: RegionId, opacity: f32);

    fn create_zone(&mut self, spec: ZoneSpec, config: &OverlayConfig) -> ZoneId;
    fn relayout_zone(&mut self, id: ZoneId, height: f32);
    fn destroy_zone(&mut self, id: ZoneId);
    fn has_zone(&self, id: ZoneId) -> bool;
    fn zone_text(&self, id: ZoneId) -> Option<String>;
}
