//! Navigation between consecutive versions of one file
//!
//! Each step runs in two phases. The first `step` in a direction stages the
//! diff to the neighbouring version as a preview; a second `step` the same way
//! commits it, the opposite way discards it.

use crate::git::GitError;
use crate::patch::{parse_patches, Direction};
use crate::surface::{OverlayConfig, TextSurface};
use crate::sync::RegionSync;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Unknown version: {0}")]
    UnknownVersion(String),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum NavError {
    #[error("No file is open")]
    NoFile,
    #[error("Fetch failed: {0}")]
    Fetch(#[source] BackendError),
    #[error("Save failed: {0}")]
    Save(#[source] BackendError),
}

/// Where file versions and their diffs come from
pub trait VersionBackend {
    /// Full text of `path` at `version`
    fn content(&self, path: &Path, version: &str) -> Result<String, BackendError>;
    /// Zero-context unified diff of `path` from `from` to `to`
    fn diff(&self, path: &Path, from: &str, to: &str) -> Result<String, BackendError>;
    /// Persist `text` as the working copy of `path`
    fn save(&mut self, path: &Path, text: &str) -> Result<(), BackendError>;
    /// False when `save` only keeps the text in memory
    fn saves_to_disk(&self) -> bool {
        true
    }
}

impl<B: VersionBackend + ?Sized> VersionBackend for Box<B> {
    fn content(&self, path: &Path, version: &str) -> Result<String, BackendError> {
        (**self).content(path, version)
    }

    fn diff(&self, path: &Path, from: &str, to: &str) -> Result<String, BackendError> {
        (**self).diff(path, from, to)
    }

    fn save(&mut self, path: &Path, text: &str) -> Result<(), BackendError> {
        (**self).save(path, text)
    }

    fn saves_to_disk(&self) -> bool {
        (**self).saves_to_disk()
    }
}

/// Position in the version list of the open file
#[derive(Debug, Clone, Serialize)]
pub struct Cursor {
    pub path: PathBuf,
    /// Oldest first
    pub versions: Vec<String>,
    pub current: usize,
    /// Version index of the staged step, if any
    pub staged: Option<usize>,
    pub staged_direction: Option<Direction>,
}

impl Cursor {
    pub fn current_version(&self) -> &str {
        &self.versions[self.current]
    }

    pub fn staged_version(&self) -> Option<&str> {
        self.staged.map(|idx| self.versions[idx].as_str())
    }

    fn clear_staged(&mut self) {
        self.staged = None;
        self.staged_direction = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Idle,
    Staged(Direction),
}

/// What a call to [`Navigator::step`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Inside the cooldown window of the previous step
    Ignored,
    /// No version in that direction
    OutOfRange,
    Staged,
    Committed,
    Discarded,
    /// The document had drifted from the current version and was reset to it
    Resynced,
}

pub struct Navigator<S: TextSurface, B: VersionBackend> {
    sync: RegionSync<S>,
    backend: B,
    cursor: Option<Cursor>,
    last_step: Option<Instant>,
}

impl<S: TextSurface + 'static, B: VersionBackend> Navigator<S, B> {
    pub fn new(surface: S, backend: B, config: OverlayConfig) -> Self {
        Self {
            sync: RegionSync::new(surface, config),
            backend,
            cursor: None,
            last_step: None,
        }
    }

    /// Open `path` at its oldest version
    pub fn set_file(&mut self, path: impl Into<PathBuf>, versions: Vec<String>) -> Result<(), NavError> {
        let path = path.into();
        let Some(first) = versions.first() else {
            return Err(NavError::Fetch(BackendError::UnknownVersion(format!(
                "{} has no versions",
                path.display()
            ))));
        };

        let text = self
            .backend
            .content(&path, first)
            .map_err(NavError::Fetch)?;
        self.sync.set_contents(&text);

        log::info!(
            "opened {} at {} ({} versions)",
            path.display(),
            first,
            versions.len()
        );
        self.cursor = Some(Cursor {
            path,
            versions,
            current: 0,
            staged: None,
            staged_direction: None,
        });
        self.last_step = None;
        Ok(())
    }

    pub fn step_forward(&mut self, now: Instant) -> Result<StepOutcome, NavError> {
        self.step(Direction::Forwards, now)
    }

    pub fn step_backward(&mut self, now: Instant) -> Result<StepOutcome, NavError> {
        self.step(Direction::Backwards, now)
    }

    pub fn step(&mut self, direction: Direction, now: Instant) -> Result<StepOutcome, NavError> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Err(NavError::NoFile);
        };

        let cooldown = self.sync.config().cooldown;
        if self
            .last_step
            .is_some_and(|last| now.saturating_duration_since(last) < cooldown)
        {
            return Ok(StepOutcome::Ignored);
        }
        self.last_step = Some(now);

        if let (Some(staged), Some(staged_direction)) = (cursor.staged, cursor.staged_direction) {
            cursor.clear_staged();
            if staged_direction == direction {
                self.sync.commit(now);
                cursor.current = staged;
                log::info!("moved to version {}", cursor.current_version());
                return Ok(StepOutcome::Committed);
            }
            self.sync.discard(now);
            return Ok(StepOutcome::Discarded);
        }

        let next = cursor.current as isize + direction.offset();
        if next < 0 || next as usize >= cursor.versions.len() {
            return Ok(StepOutcome::OutOfRange);
        }
        let next = next as usize;

        let expected = self
            .backend
            .content(&cursor.path, cursor.current_version())
            .map_err(NavError::Fetch)?;
        if self.sync.surface().full_text() != expected {
            log::warn!(
                "document drifted from version {}, resetting it",
                cursor.current_version()
            );
            self.sync.set_contents(&expected);
            return Ok(StepOutcome::Resynced);
        }

        let current = cursor.current_version();
        let target = cursor.versions[next].as_str();
        let (from, to) = match direction {
            Direction::Forwards => (current, target),
            Direction::Backwards => (target, current),
        };
        let diff = self
            .backend
            .diff(&cursor.path, from, to)
            .map_err(NavError::Fetch)?;
        let hunks = parse_patches(&diff);

        self.sync.stage(&hunks, direction, now);
        cursor.staged = Some(next);
        cursor.staged_direction = Some(direction);
        Ok(StepOutcome::Staged)
    }

    /// Write the document text back through the backend
    pub fn save_current_content(&mut self) -> Result<(), NavError> {
        let Some(cursor) = self.cursor.as_ref() else {
            return Err(NavError::NoFile);
        };
        let text = self.sync.surface().full_text();
        self.backend
            .save(&cursor.path, &text)
            .map_err(NavError::Save)?;
        log::info!("saved {}", cursor.path.display());
        Ok(())
    }

    pub fn tick(&mut self, now: Instant) {
        self.sync.tick(now);
    }

    pub fn state(&self) -> NavState {
        match self.cursor.as_ref().and_then(|c| c.staged_direction) {
            Some(direction) => NavState::Staged(direction),
            None => NavState::Idle,
        }
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn sync(&self) -> &RegionSync<S> {
        &self.sync
    }

    pub fn surface(&self) -> &S {
        self.sync.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.sync.surface_mut()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_animating(&self) -> bool {
        self.sync.is_animating()
    }
}
