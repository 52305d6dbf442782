//! rvs - scrub through a file's revision history

mod app;
mod color;
mod config;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use color::Palette;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use revscrub_core::{
    git, parse_patches, Direction, GitBackend, SnapshotBackend, VersionBackend,
};
use std::fs::File;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "rvs")]
#[command(author, version, about = "Scrub through a file's revision history")]
struct Args {
    /// File whose git history to walk
    #[arg(required_unless_present = "snapshots")]
    file: Option<PathBuf>,

    /// Walk these files as consecutive versions instead of git history
    #[arg(long, num_args = 2.., conflicts_with = "file")]
    snapshots: Vec<PathBuf>,

    /// Transition frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Transition duration in milliseconds
    #[arg(long)]
    transition_ms: Option<u64>,

    /// Minimum milliseconds between two accepted steps
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Write logs to this file (RUST_LOG controls the level)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the parsed hunks between two versions as JSON and exit
    #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
    print_hunks: Option<Vec<String>>,
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .context(format!("Failed to create log file: {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Backend, the path the navigator opens and its versions, oldest first
fn open_history(args: &Args) -> Result<(Box<dyn VersionBackend>, PathBuf, Vec<String>)> {
    if !args.snapshots.is_empty() {
        let backend = SnapshotBackend::from_files(&args.snapshots)
            .context("Failed to read snapshot files")?;
        let versions = backend.versions();
        return Ok((Box::new(backend), args.snapshots[0].clone(), versions));
    }

    let file = args
        .file
        .clone()
        .context("Usage: rvs <file> | rvs --snapshots <a> <b> ...")?;
    let versions = git::file_versions(&file)
        .context(format!("Failed to read git history of {}", file.display()))?;
    if versions.is_empty() {
        anyhow::bail!("{} has no committed versions", file.display());
    }
    Ok((Box::new(GitBackend), file, versions))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::Config::load();
    init_logging(args.log_file.as_ref())?;

    let (backend, path, versions) = open_history(&args)?;

    if let Some(range) = &args.print_hunks {
        let [from, to] = range.as_slice() else {
            anyhow::bail!("--print-hunks takes exactly two versions");
        };
        let diff = backend
            .diff(&path, from, to)
            .context(format!("Failed to diff {} against {}", from, to))?;
        println!("{}", serde_json::to_string_pretty(&parse_patches(&diff))?);
        return Ok(());
    }

    let mut overlay = config.overlay(args.fps, args.transition_ms, args.cooldown_ms);
    overlay.language = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_string());

    let mut app = App::new(backend, overlay, path, versions)?;
    app.palette = Palette::from_hex(&config.ui.added_color, &config.ui.removed_color);
    app.line_numbers = config.ui.line_numbers;
    app.zen_mode = config.ui.zen;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        return Err(err);
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(16);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let viewport_height = terminal.size()?.height.saturating_sub(1) as usize;
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        KeyCode::Right | KeyCode::Char('l') => {
                            app.step(Direction::Forwards, Instant::now())
                        }
                        KeyCode::Left | KeyCode::Char('h') => {
                            app.step(Direction::Backwards, Instant::now())
                        }
                        KeyCode::Char('s') => app.save(),
                        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
                        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
                        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.scroll_half_page_down(viewport_height)
                        }
                        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.scroll_half_page_up(viewport_height)
                        }
                        KeyCode::Home | KeyCode::Char('g') => app.goto_top(),
                        KeyCode::End | KeyCode::Char('G') => app.goto_bottom(viewport_height),
                        KeyCode::Char('n') => app.toggle_line_numbers(),
                        KeyCode::Char('Z') => app.toggle_zen(),
                        _ => {}
                    }
                }
            }
        }

        app.tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}
