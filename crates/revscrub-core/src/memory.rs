//! Version backend over in-memory text snapshots
//!
//! Diffs are computed in process, in the same zero-context unified format
//! `git diff -U0` produces.

use crate::navigator::{BackendError, VersionBackend};
use similar::{DiffTag, TextDiff};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct SnapshotBackend {
    snapshots: Vec<(String, String)>,
    saved: Option<String>,
}

impl SnapshotBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a version named `name`
    pub fn push(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.snapshots.push((name.into(), text.into()));
    }

    /// One version per file, in the order given, named after the path
    pub fn from_files(paths: &[PathBuf]) -> Result<Self, BackendError> {
        let mut backend = Self::new();
        for path in paths {
            let text = std::fs::read_to_string(path)?;
            backend.push(path.display().to_string(), text);
        }
        Ok(backend)
    }

    pub fn versions(&self) -> Vec<String> {
        self.snapshots.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn text(&self, version: &str) -> Option<&str> {
        self.snapshots
            .iter()
            .find(|(name, _)| name == version)
            .map(|(_, text)| text.as_str())
    }

    /// Text handed to the last save
    pub fn saved(&self) -> Option<&str> {
        self.saved.as_deref()
    }

    fn lookup(&self, version: &str) -> Result<&str, BackendError> {
        self.text(version)
            .ok_or_else(|| BackendError::UnknownVersion(version.to_string()))
    }
}

impl VersionBackend for SnapshotBackend {
    fn content(&self, _path: &Path, version: &str) -> Result<String, BackendError> {
        self.lookup(version).map(String::from)
    }

    fn diff(&self, _path: &Path, from: &str, to: &str) -> Result<String, BackendError> {
        Ok(unified_diff(self.lookup(from)?, self.lookup(to)?))
    }

    fn save(&mut self, _path: &Path, text: &str) -> Result<(), BackendError> {
        self.saved = Some(text.to_string());
        Ok(())
    }

    fn saves_to_disk(&self) -> bool {
        false
    }
}

/// Zero-context unified diff body (hunks only, no file headers)
///
/// Hunk positions come from running line counters over the ops, so every
/// header names the same lines `git diff -U0` would.
pub fn unified_diff(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let new_lines: Vec<&str> = new.split_inclusive('\n').collect();
    let diff = TextDiff::from_lines(old, new);

    let mut out = String::new();
    let (mut old_at, mut new_at) = (0, 0);
    // old and new line where the open hunk starts
    let mut open: Option<(usize, usize)> = None;

    for op in diff.ops() {
        let old_len = op.old_range().len();
        let new_len = op.new_range().len();
        if op.tag() == DiffTag::Equal {
            if old_len > 0 {
                if let Some(start) = open.take() {
                    push_hunk(&mut out, &old_lines, &new_lines, start, (old_at, new_at));
                }
            }
        } else if open.is_none() {
            open = Some((old_at, new_at));
        }
        old_at += old_len;
        new_at += new_len;
    }
    if let Some(start) = open {
        push_hunk(&mut out, &old_lines, &new_lines, start, (old_at, new_at));
    }
    out
}

fn push_hunk(
    out: &mut String,
    old_lines: &[&str],
    new_lines: &[&str],
    (old_start, new_start): (usize, usize),
    (old_end, new_end): (usize, usize),
) {
    out.push_str(&format!(
        "@@ -{} +{} @@\n",
        header_range(old_start, old_end - old_start),
        header_range(new_start, new_end - new_start)
    ));
    for line in &old_lines[old_start..old_end] {
        push_line(out, '-', line);
    }
    for line in &new_lines[new_start..new_end] {
        push_line(out, '+', line);
    }
}

/// `start` is 0-based; an empty range names the line before it
fn header_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

fn push_line(out: &mut String, marker: char, line: &str) {
    out.push(marker);
    out.push_str(line);
    if !line.ends_with('\n') {
        out.push_str("\n\\ No newline at end of file\n");
    }
}
