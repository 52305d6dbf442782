//! UI rendering for the TUI

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use revscrub_core::{MarkerClass, Row};
use unicode_width::UnicodeWidthChar;

const TAB_WIDTH: usize = 4;

/// Main drawing function
pub fn draw(frame: &mut Frame, app: &App) {
    if app.zen_mode {
        draw_content(frame, app, frame.area());
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),    // Main content
                Constraint::Length(1), // Status bar
            ])
            .split(frame.area());

        draw_content(frame, app, chunks[0]);
        draw_status_bar(frame, app, chunks[1]);
    }
}

fn draw_content(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.rows();
    let gutter = if app.line_numbers {
        rows.iter()
            .filter_map(|row| row.number)
            .max()
            .unwrap_or(1)
            .to_string()
            .len()
            + 2
    } else {
        2
    };
    let text_width = (area.width as usize).saturating_sub(gutter);

    let lines: Vec<Line> = rows
        .iter()
        .skip(app.scroll)
        .take(area.height as usize)
        .map(|row| render_row(app, row, gutter, text_width))
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_row(app: &App, row: &Row, gutter: usize, text_width: usize) -> Line<'static> {
    let muted = Style::default().fg(Color::DarkGray);

    let sign = match row.mark {
        Some(mark) if mark.floating => match mark.class {
            MarkerClass::Added => "+",
            MarkerClass::Deleted => "-",
        },
        _ => " ",
    };
    let number = match (app.line_numbers, row.number) {
        (true, Some(n)) => format!("{:>width$}", n, width = gutter - 2),
        (true, None) => " ".repeat(gutter - 2),
        (false, _) => String::new(),
    };

    let text = fit_to_width(&row.text, text_width);
    let mut text_style = Style::default();
    if let Some(mark) = row.mark {
        let bg = app.palette.background(mark.class, mark.intensity);
        text_style = text_style.bg(bg);
        if mark.floating {
            text_style = text_style.add_modifier(Modifier::ITALIC);
        }
    }

    Line::from(vec![
        Span::styled(number, muted),
        Span::styled(format!("{} ", sign), muted),
        Span::styled(text, text_style),
    ])
}

/// Expand tabs, cut to `width` columns, pad with spaces so backgrounds span the row
fn fit_to_width(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for ch in text.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - used % TAB_WIDTH;
            if used + pad > width {
                break;
            }
            out.push_str(&" ".repeat(pad));
            used += pad;
            continue;
        }
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        app.status_text(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];

    if let Some(message) = &app.message {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }

    spans.push(Span::styled(
        "  h/l step  s save  q quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_to_width_pads_and_cuts() {
        assert_eq!(fit_to_width("abc", 5), "abc  ");
        assert_eq!(fit_to_width("abcdef", 4), "abcd");
        assert_eq!(fit_to_width("\tx", 6), "    x ");
    }

    #[test]
    fn test_fit_to_width_counts_wide_chars() {
        assert_eq!(fit_to_width("日本語", 5), "日本 ");
    }
}
