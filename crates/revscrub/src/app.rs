//! Application state for the TUI

use crate::color::Palette;
use revscrub_core::{
    Buffer, Direction, NavState, Navigator, OverlayConfig, Row, StepOutcome, VersionBackend,
};
use std::path::PathBuf;
use std::time::Instant;

pub type HistoryNavigator = Navigator<Buffer, Box<dyn VersionBackend>>;

pub struct App {
    pub navigator: HistoryNavigator,
    pub palette: Palette,
    /// First visible display row
    pub scroll: usize,
    pub line_numbers: bool,
    pub zen_mode: bool,
    /// Last step result or error, shown in the status bar
    pub message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        backend: Box<dyn VersionBackend>,
        overlay: OverlayConfig,
        path: PathBuf,
        versions: Vec<String>,
    ) -> anyhow::Result<Self> {
        let mut navigator = Navigator::new(Buffer::default(), backend, overlay);
        navigator.set_file(path, versions)?;
        Ok(Self {
            navigator,
            palette: Palette::default(),
            scroll: 0,
            line_numbers: true,
            zen_mode: false,
            message: None,
            should_quit: false,
        })
    }

    pub fn step(&mut self, direction: Direction, now: Instant) {
        match self.navigator.step(direction, now) {
            Ok(StepOutcome::Ignored) => {}
            Ok(StepOutcome::OutOfRange) => {
                self.message = Some(match direction {
                    Direction::Forwards => "at newest version".to_string(),
                    Direction::Backwards => "at oldest version".to_string(),
                });
            }
            Ok(StepOutcome::Resynced) => {
                self.message = Some("document reset to current version".to_string());
            }
            Ok(_) => self.message = None,
            Err(err) => {
                log::error!("step failed: {err}");
                self.message = Some(err.to_string());
            }
        }
    }

    pub fn save(&mut self) {
        self.message = Some(match self.navigator.save_current_content() {
            Ok(()) if self.navigator.backend().saves_to_disk() => "saved".to_string(),
            Ok(()) => "kept in memory (snapshot mode)".to_string(),
            Err(err) => {
                log::error!("{err}");
                err.to_string()
            }
        });
    }

    pub fn tick(&mut self, now: Instant) {
        self.navigator.tick(now);
    }

    pub fn rows(&self) -> Vec<Row> {
        self.navigator.surface().layout()
    }

    pub fn scroll_down(&mut self) {
        let max = self.rows().len().saturating_sub(1);
        self.scroll = (self.scroll + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self, viewport_height: usize) {
        let max = self.rows().len().saturating_sub(1);
        self.scroll = (self.scroll + viewport_height / 2).min(max);
    }

    pub fn scroll_half_page_up(&mut self, viewport_height: usize) {
        self.scroll = self.scroll.saturating_sub(viewport_height / 2);
    }

    pub fn goto_top(&mut self) {
        self.scroll = 0;
    }

    pub fn goto_bottom(&mut self, viewport_height: usize) {
        self.scroll = self.rows().len().saturating_sub(viewport_height);
    }

    pub fn toggle_zen(&mut self) {
        self.zen_mode = !self.zen_mode;
    }

    pub fn toggle_line_numbers(&mut self) {
        self.line_numbers = !self.line_numbers;
    }

    /// e.g. `notes.txt  2/5 e83c516  ▶ staged`
    pub fn status_text(&self) -> String {
        let Some(cursor) = self.navigator.cursor() else {
            return String::new();
        };
        let name = cursor
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| cursor.path.display().to_string());

        let mut status = format!(
            "{}  {}/{} {}",
            name,
            cursor.current + 1,
            cursor.versions.len(),
            cursor.current_version()
        );
        if let NavState::Staged(direction) = self.navigator.state() {
            let arrow = match direction {
                Direction::Forwards => "▶",
                Direction::Backwards => "◀",
            };
            status.push_str(&format!("  {} staged", arrow));
        }
        status
    }
}
