//! revscrub core - overlay engine for scrubbing through a file's history
//!
//! A version step is shown as a staged preview before it is written into the
//! document: lines about to disappear are marked as removal regions, lines about
//! to appear float as insertion placeholders. Committing turns the preview into
//! one batched edit and fades the result out; discarding fades the preview away
//! without touching the text.

pub mod buffer;
pub mod git;
pub mod marker;
pub mod memory;
pub mod navigator;
pub mod patch;
pub mod remap;
pub mod surface;
pub mod sync;
pub mod transition;

pub use buffer::{Buffer, Mark, Row};
pub use git::{GitBackend, GitError};
pub use marker::{Marker, MarkerKind, MarkerSet};
pub use memory::{unified_diff, SnapshotBackend};
pub use navigator::{
    BackendError, Cursor, NavError, NavState, Navigator, StepOutcome, VersionBackend,
};
pub use patch::{parse_patches, parse_patches_strict, Direction, Hunk, PatchError};
pub use remap::{remap, remap_with, Bias, LineEdit, LineRange};
pub use surface::{
    MarkerClass, OverlayConfig, Region, RegionId, RegionSetId, TextSurface, ZoneId, ZoneSpec,
};
pub use sync::RegionSync;
pub use transition::{smoothstep, Scheduler, Tick};
