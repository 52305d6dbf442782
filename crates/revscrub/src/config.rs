//! Configuration file support for rvs
//!
//! Config file location: `~/.config/revscrub/config.toml` (XDG_CONFIG_HOME)
//!
//! Example config:
//! ```toml
//! [ui]
//! added_color = "#3b5a3a"
//! removed_color = "#6a3336"
//! line_numbers = true
//! zen = false
//!
//! [playback]
//! fps = 60
//! transition_ms = 200
//! cooldown_ms = 100
//! ```

use revscrub_core::OverlayConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// UI configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Background for added lines, hex
    pub added_color: String,
    /// Background for removed lines, hex
    pub removed_color: String,
    pub line_numbers: bool,
    /// Hide the status bar
    pub zen: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            added_color: "#3b5a3a".to_string(),
            removed_color: "#6a3336".to_string(),
            line_numbers: true,
            zen: false,
        }
    }
}

/// Playback configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Transition frame rate
    pub fps: u32,
    /// How long fades and grows take, in milliseconds
    pub transition_ms: u64,
    /// Minimum time between two accepted steps, in milliseconds
    pub cooldown_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        let overlay = OverlayConfig::default();
        Self {
            fps: overlay.frames_per_second,
            transition_ms: overlay.transition.as_millis() as u64,
            cooldown_ms: overlay.cooldown.as_millis() as u64,
        }
    }
}

/// Root configuration
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub ui: UiConfig,
    pub playback: PlaybackConfig,
}

impl Config {
    /// Get all possible config file paths in priority order
    fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG_CONFIG_HOME (if set)
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("revscrub").join("config.toml"));
        }

        // 2. ~/.config/revscrub/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("revscrub").join("config.toml"));
        }

        // 3. Platform-specific config dir (~/Library/Application Support on macOS)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("revscrub").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        paths
    }

    /// Get the first existing config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|p| p.exists())
    }

    /// Load config from XDG config path
    /// Returns default config if file doesn't exist or can't be parsed
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| std::fs::read_to_string(&path).ok())
            .and_then(|content| Self::parse(&content))
            .unwrap_or_default()
    }

    fn parse(content: &str) -> Option<Self> {
        toml::from_str(content)
            .map_err(|e| {
                eprintln!("Warning: Failed to parse config: {}", e);
                e
            })
            .ok()
    }

    /// Overlay settings, with command line overrides applied on top
    pub fn overlay(
        &self,
        fps: Option<u32>,
        transition_ms: Option<u64>,
        cooldown_ms: Option<u64>,
    ) -> OverlayConfig {
        OverlayConfig {
            frames_per_second: fps.unwrap_or(self.playback.fps).max(1),
            transition: Duration::from_millis(transition_ms.unwrap_or(self.playback.transition_ms)),
            cooldown: Duration::from_millis(cooldown_ms.unwrap_or(self.playback.cooldown_ms)),
            language: None,
        }
    }
}
