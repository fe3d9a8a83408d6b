use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::tui::app::{App, Screen};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(44)])
        .split(area);

    let titles: Vec<Line> = Screen::ALL
        .iter()
        .enumerate()
        .map(|(i, screen)| Line::from(format!("{} {}", i + 1, screen.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" 🎓 Bursary Admin ", app.theme.title()))
                .border_style(Style::default().fg(app.theme.primary)),
        )
        .select(app.screen.index())
        .style(Style::default().fg(app.theme.muted))
        .highlight_style(app.theme.title())
        .divider("│");

    frame.render_widget(tabs, chunks[0]);

    let who = Line::from(vec![
        Span::styled(
            app.identity.display_name.clone(),
            Style::default().fg(app.theme.foreground),
        ),
        Span::raw(" | "),
        Span::styled(
            app.identity.role.to_string(),
            Style::default().fg(if app.identity.is_staff() {
                app.theme.success
            } else {
                app.theme.info
            }),
        ),
    ]);

    let identity = Paragraph::new(who).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.primary)),
    );

    frame.render_widget(identity, chunks[1]);
}
