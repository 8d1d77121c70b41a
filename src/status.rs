use chrono::Local;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::ui::sel_style;

// ── Status bar ────────────────────────────────────────────────────────────────

pub fn render_status_bar(f: &mut Frame, area: Rect) {
    if area.height == 0 { return; }

    let now = Local::now().format("%A, %d. %B - %I:%M%p").to_string();

    let left = Span::styled(format!(" {now}"), sel_style());
    let pad = " ".repeat((area.width as usize).saturating_sub(now.len() + 1));

    let line = Line::from(vec![left, Span::styled(pad, sel_style())]);
    f.render_widget(Paragraph::new(line), area);
}
