//! Git integration for walking a single file's history

use crate::navigator::{BackendError, VersionBackend};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository")]
    NotARepo,
    #[error("Git command failed: {0}")]
    CommandFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check if a directory is a git repository
pub fn is_git_repo(path: &Path) -> bool {
    Command::new("git")
        .arg("-C")
        .arg(path)
        .arg("rev-parse")
        .arg("--git-dir")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Directory git runs in and the file name relative to it
fn split_path(file: &Path) -> (PathBuf, String) {
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    (dir, name)
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git").arg("-C").arg(dir).args(args).output()?;

    if !output.status.success() {
        return Err(GitError::CommandFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Abbreviated commit ids touching `file`, oldest first
pub fn file_versions(file: &Path) -> Result<Vec<String>, GitError> {
    let (dir, name) = split_path(file);
    if !is_git_repo(&dir) {
        return Err(GitError::NotARepo);
    }
    let output = run_git(&dir, &["log", "--pretty=format:%h", "--", &name])?;
    Ok(parse_version_list(&output))
}

/// Content of `file` at `version`
pub fn file_at_version(file: &Path, version: &str) -> Result<String, GitError> {
    let (dir, name) = split_path(file);
    run_git(&dir, &["show", &format!("{version}:./{name}")])
}

/// Zero-context diff of `file` between two versions
pub fn file_diff(file: &Path, from: &str, to: &str) -> Result<String, GitError> {
    let (dir, name) = split_path(file);
    run_git(&dir, &["diff", "-U0", from, to, "--", &name])
}

/// `git log` lists newest first
fn parse_version_list(output: &str) -> Vec<String> {
    let mut versions: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    versions.reverse();
    versions
}

/// Versions come from the repository, saves go to the working tree
#[derive(Debug, Default, Clone, Copy)]
pub struct GitBackend;

impl VersionBackend for GitBackend {
    fn content(&self, path: &Path, version: &str) -> Result<String, BackendError> {
        Ok(file_at_version(path, version)?)
    }

    fn diff(&self, path: &Path, from: &str, to: &str) -> Result<String, BackendError> {
        Ok(file_diff(path, from, to)?)
    }

    fn save(&mut self, path: &Path, text: &str) -> Result<(), BackendError> {
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_list() {
        let output = "9fceb02\n4c1a2b3\n\ne83c516\n";
        assert_eq!(
            parse_version_list(output),
            vec!["e83c516", "4c1a2b3", "9fceb02"]
        );
        assert!(parse_version_list("").is_empty());
    }

    #[test]
    fn test_split_path() {
        assert_eq!(
            split_path(Path::new("src/lib/main.rs")),
            (PathBuf::from("src/lib"), "main.rs".to_string())
        );
        assert_eq!(
            split_path(Path::new("README.md")),
            (PathBuf::from("."), "README.md".to_string())
        );
    }

    #[test]
    fn test_save_writes_working_copy() {
        let path = std::env::temp_dir().join(format!("revscrub-save-{}.txt", std::process::id()));
        let mut backend = GitBackend;
        backend.save(&path, "saved\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "saved\n");
        std::fs::remove_file(&path).unwrap();
    }
}
