use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Cell, Chart, Dataset, GraphType, Row, Table},
};

use crate::dashboard::DashboardSummary;

pub const CORRECTNESS_TITLE: &str = "Correct vs Incorrect";
pub const ACCURACY_TITLE: &str = "Accuracy by Model";
pub const SCATTER_TITLE: &str = "Emotion Space (Valence/Arousal)";

/// Series colors, assigned in emotion-name order.
const PALETTE: [Color; 9] = [
    Color::Red,
    Color::Magenta,
    Color::Green,
    Color::Blue,
    Color::Yellow,
    Color::Gray,
    Color::Cyan,
    Color::LightRed,
    Color::White,
];

pub fn render(frame: &mut Frame, summary: &DashboardSummary, area: Rect) {
    // Model performance on top, emotion space below
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    render_correctness(frame, summary, top[0]);
    render_accuracy(frame, summary, top[1]);
    render_scatter(frame, summary, rows[1]);
}

fn render_correctness(frame: &mut Frame, summary: &DashboardSummary, area: Rect) {
    let counts = summary.correctness;
    let bars = [
        Bar::default()
            .label("Correct".into())
            .value(counts.correct)
            .style(Style::default().fg(Color::Green)),
        Bar::default()
            .label("Incorrect".into())
            .value(counts.incorrect)
            .style(Style::default().fg(Color::Red)),
    ];

    let chart = BarChart::default()
        .block(Block::bordered().title(format!(" {} ", CORRECTNESS_TITLE)))
        .data(BarGroup::default().bars(&bars))
        .bar_width(11)
        .bar_gap(3);
    frame.render_widget(chart, area);
}

fn render_accuracy(frame: &mut Frame, summary: &DashboardSummary, area: Rect) {
    let header = Row::new(vec!["Model", "Accuracy", "Samples"])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = summary
        .accuracy_by_model
        .iter()
        .map(|model| {
            Row::new(vec![
                Cell::from(model.model_name.clone()),
                Cell::from(model.formatted.clone()),
                Cell::from(model.samples.to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ],
    )
    .header(header)
    .block(Block::bordered().title(format!(" {} ", ACCURACY_TITLE)));
    frame.render_widget(table, area);
}

fn render_scatter(frame: &mut Frame, summary: &DashboardSummary, area: Rect) {
    let datasets: Vec<Dataset> = summary
        .scatter
        .iter()
        .enumerate()
        .map(|(i, series)| {
            Dataset::default()
                .name(series.emotion.clone())
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(&series.points)
        })
        .collect();

    let axis_labels = || vec!["-1.0", "0.0", "1.0"];

    let chart = Chart::new(datasets)
        .block(Block::bordered().title(format!(" {} ", SCATTER_TITLE)))
        .x_axis(
            Axis::default()
                .title("predicted valence")
                .style(Style::default().fg(Color::Gray))
                .bounds([-1.0, 1.0])
                .labels(axis_labels()),
        )
        .y_axis(
            Axis::default()
                .title("predicted arousal")
                .style(Style::default().fg(Color::Gray))
                .bounds([-1.0, 1.0])
                .labels(axis_labels()),
        )
        .hidden_legend_constraints((Constraint::Ratio(1, 3), Constraint::Ratio(1, 2)));
    frame.render_widget(chart, area);
}
