mod charts;
mod status_bar;

use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Wrap},
};

use crate::app::App;
use crate::dashboard::DashboardState;

pub const TITLE: &str = "Emotion Analysis Dashboard";

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Content area + status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match app.state() {
        DashboardState::Empty { warning, detail } => {
            render_warning(frame, warning, detail.as_deref(), main_chunks[0]);
        }
        DashboardState::Ready(summary) => charts::render(frame, summary, main_chunks[0]),
    }

    status_bar::render(frame, app, main_chunks[1]);
}

fn render_warning(frame: &mut Frame, warning: &str, detail: Option<&str>, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("⚠ {}", warning),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(detail) = detail {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            detail.to_string(),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::bordered().title(format!(" {} ", TITLE)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardState;
    use crate::db::AnalyticsRow;
    use ratatui::backend::TestBackend;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_empty_view_renders_warning_only() {
        let app = App::new(DashboardState::from_view(&Vec::new()));
        let screen = draw(&app);

        assert!(screen.contains("Could not load data"));
        assert!(!screen.contains(charts::CORRECTNESS_TITLE));
        assert!(!screen.contains(charts::ACCURACY_TITLE));
        assert!(!screen.contains(charts::SCATTER_TITLE));
    }

    #[test]
    fn test_populated_view_renders_three_charts() {
        let view = vec![
            AnalyticsRow {
                is_correct_prediction: Some(true),
                predicted_valence: Some(0.5),
                predicted_arousal: Some(0.5),
                emotion_name: Some("Happy".to_string()),
                model_name: Some("V1_ResNet".to_string()),
                ..Default::default()
            },
            AnalyticsRow {
                is_correct_prediction: Some(false),
                predicted_valence: Some(-0.5),
                predicted_arousal: Some(-0.5),
                emotion_name: Some("Anger".to_string()),
                model_name: Some("V1_MobileNet".to_string()),
                ..Default::default()
            },
        ];
        let app = App::new(DashboardState::from_view(&view));
        let screen = draw(&app);

        assert!(screen.contains(charts::CORRECTNESS_TITLE));
        assert!(screen.contains(charts::ACCURACY_TITLE));
        assert!(screen.contains(charts::SCATTER_TITLE));
        assert!(screen.contains("V1_ResNet"));
        assert!(screen.contains("100.00%"));
        assert!(!screen.contains("Could not load data"));
    }
}
