use ratatui::{
    prelude::*,
    widgets::Paragraph,
};

use crate::app::App;
use crate::dashboard::DashboardState;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();

    // Left: source
    spans.push(Span::styled(
        format!(" {} ", app.source()),
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    // Middle: row count or degraded marker
    match app.state() {
        DashboardState::Ready(summary) => spans.push(Span::styled(
            format!(" {} rows ", summary.total_rows),
            Style::default().fg(Color::Gray),
        )),
        DashboardState::Empty { .. } => spans.push(Span::styled(
            " no data ",
            Style::default().fg(Color::Yellow),
        )),
    }

    let content_len: usize = spans.iter().map(|s| s.content.len()).sum();
    let help_text = " q:quit ";
    let help_len = help_text.len();

    let available = area.width as usize;
    if available > content_len + help_len {
        let spacing = " ".repeat(available - content_len - help_len);
        spans.push(Span::raw(spacing));
    }

    // Right: help hints
    spans.push(Span::styled(
        help_text,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    let paragraph = Paragraph::new(Line::from(spans));
    frame.render_widget(paragraph, area);
}
