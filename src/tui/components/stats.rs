use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{models::ApplicationStatus, tui::app::App};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ])
        .split(area);

    let stats = &app.stats;
    let theme = &app.theme;

    render_stat(frame, chunks[0], "Applications", stats.total.to_string(), theme.primary);
    render_stat(
        frame,
        chunks[1],
        "Pending",
        stats.pending.to_string(),
        theme.status(ApplicationStatus::Pending),
    );
    render_stat(
        frame,
        chunks[2],
        "Approved",
        stats.approved.to_string(),
        theme.status(ApplicationStatus::Approved),
    );
    render_stat(
        frame,
        chunks[3],
        "Rejected",
        stats.rejected.to_string(),
        theme.status(ApplicationStatus::Rejected),
    );
    render_stat(
        frame,
        chunks[4],
        "Approval rate",
        format!("{:.1}%", stats.approval_rate()),
        theme.info,
    );
}

fn render_stat(frame: &mut Frame, area: Rect, label: &str, value: String, color: Color) {
    let text = vec![
        Line::from(Span::styled(label, Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
