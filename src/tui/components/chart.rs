use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

use crate::{models::ApplicationStatus, tui::app::App};

const STATUSES: [ApplicationStatus; 3] = [
    ApplicationStatus::Pending,
    ApplicationStatus::Approved,
    ApplicationStatus::Rejected,
];

/// Applications per status
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let bars: Vec<Bar> = STATUSES
        .iter()
        .map(|status| {
            let color = theme.status(*status);
            Bar::default()
                .label(status.as_str().into())
                .value(app.stats.count(*status) as u64)
                .style(Style::default().fg(color))
                .value_style(Style::default().bg(color).add_modifier(Modifier::BOLD))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(Span::styled("Applications by Status", Style::default().fg(theme.primary)))
                .borders(Borders::ALL),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(3);

    frame.render_widget(chart, area);
}
