use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{
    analytics::most_recent,
    tui::{app::App, components},
    utils::format_amount,
};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),      // Stats
            Constraint::Percentage(45), // Chart and totals
            Constraint::Min(0),         // Logs
        ])
        .split(area);

    components::stats::render(frame, chunks[0], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    components::chart::render(frame, middle[0], app);
    render_totals(frame, middle[1], app);

    components::logs::render(frame, chunks[2], app);
}

fn render_totals(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let label =
        |text: &str| Span::styled(format!("{:12}", text), Style::default().fg(theme.muted));

    let mut lines = vec![Line::from(Span::styled("Amount applied for", theme.title()))];
    for (currency, total) in &app.stats.applied_totals {
        lines.push(Line::from(vec![
            label(currency.as_str()),
            Span::raw(format_amount(*total)),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Approved", theme.title())));
    for (currency, total) in &app.stats.approved_totals {
        lines.push(Line::from(vec![
            label(currency.as_str()),
            Span::styled(format_amount(*total), Style::default().fg(theme.success)),
        ]));
    }

    if let Some(latest) = most_recent(&app.applications) {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Latest application", theme.title())));
        lines.push(Line::from(vec![
            label("Applicant"),
            Span::raw(latest.applicant_full_name.clone()),
        ]));
        lines.push(Line::from(vec![
            label("Status"),
            Span::styled(
                latest.application_status.as_str(),
                Style::default().fg(theme.status(latest.application_status)),
            ),
        ]));
        if let Some(date) = latest.application_date {
            lines.push(Line::from(vec![
                label("Submitted"),
                Span::raw(date.format("%Y-%m-%d").to_string()),
            ]));
        }
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Totals")
            .border_style(Style::default().fg(theme.primary)),
    );

    frame.render_widget(paragraph, area);
}
