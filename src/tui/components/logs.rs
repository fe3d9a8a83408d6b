use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::tui::app::App;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let visible = area.height.saturating_sub(2) as usize;

    let items: Vec<ListItem> = app
        .activity
        .entries()
        .into_iter()
        .rev()
        .take(visible)
        .map(|entry| {
            let (icon, color) = theme.log(entry.level);
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::styled(
                    entry.timestamp.format("[%H:%M:%S]").to_string(),
                    Style::default().fg(theme.border),
                ),
                Span::raw(" "),
                Span::raw(entry.message),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Activity")
            .border_style(Style::default().fg(theme.primary)),
    );

    frame.render_widget(list, area);
}
