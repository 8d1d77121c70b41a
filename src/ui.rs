use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::time::Duration;

use crate::config::{HEADER_LINES, THEME};
use crate::status::render_status_bar;

pub type Term = Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>;

// ── Padding ───────────────────────────────────────────────────────────────────
// Horizontal padding applied to every screen so text never touches the edges.
const H_PAD: u16 = 3;

/// Shrink a rect by H_PAD columns on each side.
pub fn pad_horizontal(area: Rect) -> Rect {
    let pad = H_PAD.min(area.width / 2);
    Rect {
        x: area.x + pad,
        y: area.y,
        width: area.width.saturating_sub(pad * 2),
        height: area.height,
    }
}

// ── Color helpers ─────────────────────────────────────────────────────────────

pub fn normal_style()   -> Style { Style::default().fg(THEME) }
pub fn sel_style()      -> Style { Style::default().fg(ratatui::style::Color::Black).bg(THEME).add_modifier(Modifier::BOLD) }
pub fn title_style()    -> Style { Style::default().fg(THEME).add_modifier(Modifier::BOLD) }
pub fn dim_style()      -> Style { Style::default().fg(THEME).add_modifier(Modifier::DIM) }

// ── Header ────────────────────────────────────────────────────────────────────

pub fn render_header(f: &mut Frame, area: Rect) {
    let inner = pad_horizontal(area);
    let lines: Vec<Line> = HEADER_LINES
        .iter()
        .map(|l| Line::from(Span::styled(*l, title_style())))
        .collect();
    let p = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(p, inner);
}

pub fn render_separator(f: &mut Frame, area: Rect) {
    let inner = pad_horizontal(area);
    let sep = "=".repeat(inner.width as usize);
    let p = Paragraph::new(sep).alignment(Alignment::Center).style(dim_style());
    f.render_widget(p, inner);
}

// ── Menu ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuResult {
    Selected(String),
    Back,
}

pub fn run_menu(
    terminal: &mut Term,
    title: &str,
    choices: &[&str],
    subtitle: Option<&str>,
) -> Result<MenuResult> {
    let selectable: Vec<&str> = choices.iter().copied().filter(|c| *c != "---").collect();
    let mut idx = 0usize;

    loop {
        terminal.draw(|f| {
            let size = f.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    if subtitle.is_some() { Constraint::Length(2) } else { Constraint::Length(0) },
                    Constraint::Min(1),
                    Constraint::Length(1),
                ])
                .split(size);

            render_header(f, chunks[0]);
            render_separator(f, chunks[1]);

            let title_area = pad_horizontal(chunks[2]);
            let title_p = Paragraph::new(title).alignment(Alignment::Center).style(title_style());
            f.render_widget(title_p, title_area);
            render_separator(f, chunks[3]);

            if let Some(sub) = subtitle {
                let sub_area = pad_horizontal(chunks[4]);
                let sp = Paragraph::new(Span::styled(sub, dim_style()))
                    .alignment(Alignment::Left);
                f.render_widget(sp, sub_area);
            }

            let content_area = pad_horizontal(chunks[5]);
            let mut lines: Vec<Line> = Vec::new();
            for &choice in choices {
                if choice == "---" {
                    lines.push(Line::from(Span::styled("", dim_style())));
                    continue;
                }
                let selected = selectable.get(idx).copied() == Some(choice);
                if selected {
                    lines.push(Line::from(Span::styled(
                        format!("  > {choice}"),
                        sel_style(),
                    )));
                } else {
                    lines.push(Line::from(Span::styled(
                        format!("    {choice}"),
                        normal_style(),
                    )));
                }
            }
            let p = Paragraph::new(lines);
            f.render_widget(p, content_area);

            render_status_bar(f, chunks[6]);
        })?;

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press { continue; }
                match key.code {
                    KeyCode::Up | KeyCode::Char('k') => {
                        if !selectable.is_empty() {
                            idx = idx.saturating_sub(1);
                        }
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        if !selectable.is_empty() {
                            idx = (idx + 1).min(selectable.len() - 1);
                        }
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        if let Some(&sel) = selectable.get(idx) {
                            return Ok(MenuResult::Selected(sel.to_string()));
                        }
                    }
                    KeyCode::Char('q') | KeyCode::Esc | KeyCode::Tab => {
                        return Ok(MenuResult::Back);
                    }
                    _ => {}
                }
            }
        }
    }
}

// ── Text input ────────────────────────────────────────────────────────────────

pub fn input_prompt(terminal: &mut Term, prompt: &str) -> Result<Option<String>> {
    read_line(terminal, prompt, false)
}

/// Like `input_prompt` but echoes `*` per character; used for passwords.
pub fn password_prompt(terminal: &mut Term, prompt: &str) -> Result<Option<String>> {
    read_line(terminal, prompt, true)
}

fn read_line(terminal: &mut Term, prompt: &str, mask: bool) -> Result<Option<String>> {
    let mut buf = String::new();

    loop {
        terminal.draw(|f| {
            let size = f.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Min(1),
                    Constraint::Length(1),
                ])
                .split(size);

            render_header(f, chunks[0]);
            render_separator(f, chunks[1]);

            let content_area = pad_horizontal(chunks[2]);
            let shown = if mask { "*".repeat(buf.chars().count()) } else { buf.clone() };
            let display = format!("{prompt}\n\n  > {shown}█");
            let p = Paragraph::new(display).style(normal_style());
            f.render_widget(p, content_area);
            render_status_bar(f, chunks[3]);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press { continue; }
                match key.code {
                    KeyCode::Enter => {
                        return Ok(Some(buf.trim().to_string()));
                    }
                    KeyCode::Esc => {
                        return Ok(None);
                    }
                    KeyCode::Backspace => {
                        buf.pop();
                    }
                    KeyCode::Char(c) => {
                        if (c as u32) >= 32 {
                            buf.push(c);
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

// ── Confirmation dialog ───────────────────────────────────────────────────────

pub fn confirm(terminal: &mut Term, message: &str) -> Result<bool> {
    loop {
        terminal.draw(|f| {
            let size = f.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(1)])
                .split(size);
            render_header(f, chunks[0]);

            let content_area = pad_horizontal(chunks[1]);
            let msg = format!("{message}\n\n  [y] Yes    [n] No");
            let p = Paragraph::new(msg).style(normal_style());
            f.render_widget(p, content_area);
            render_status_bar(f, chunks[2]);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press { continue; }
                match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => return Ok(true),
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return Ok(false),
                    _ => {}
                }
            }
        }
    }
}

// ── Message flash ─────────────────────────────────────────────────────────────

pub fn flash_message(terminal: &mut Term, message: &str, ms: u64) -> Result<()> {
    terminal.draw(|f| {
        let size = f.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(1)])
            .split(size);
        render_header(f, chunks[0]);
        let content_area = pad_horizontal(chunks[1]);
        let p = Paragraph::new(format!("\n  {message}")).style(normal_style());
        f.render_widget(p, content_area);
        render_status_bar(f, chunks[2]);
    })?;
    std::thread::sleep(Duration::from_millis(ms));
    Ok(())
}

// ── Captions ──────────────────────────────────────────────────────────────────

/// Short human label for an uploaded image: date plus payload size.
pub fn image_caption(uploaded_at: &str, data_len: usize) -> String {
    // RFC 3339 "2024-05-01T12:33:07.123+00:00" → keep the date and hh:mm.
    let when = uploaded_at.get(..16).unwrap_or(uploaded_at).replace('T', " ");
    format!("{when}  {}", human_size(data_len))
}

pub fn human_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_trims_timestamp_to_minutes() {
        let c = image_caption("2024-05-01T12:33:07+00:00", 2048);
        assert_eq!(c, "2024-05-01 12:33  2.0 KB");
    }

    #[test]
    fn human_size_picks_sane_units() {
        assert_eq!(human_size(12), "12 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
