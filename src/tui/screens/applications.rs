use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::tui::{
    app::{App, Mode},
    components,
};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search
            Constraint::Min(0),    // Table
            Constraint::Length(1), // Paging
        ])
        .split(area);

    render_search(frame, chunks[0], app);

    let page = app.current_page();
    let title = format!("Applications ({})", app.status_filter.label());
    let highlight = if page.items.is_empty() {
        None
    } else {
        Some(app.cursor)
    };
    components::applications_table::render(frame, chunks[1], app, &title, &page.items, highlight);

    let footer = Line::from(vec![
        Span::styled(page.label(), Style::default().fg(app.theme.muted)),
        Span::raw("  "),
        Span::styled(
            format!("{} selected", app.selection.len()),
            Style::default().fg(app.theme.primary),
        ),
    ]);
    frame.render_widget(Paragraph::new(footer), chunks[2]);
}

fn render_search(frame: &mut Frame, area: Rect, app: &App) {
    let editing = app.mode == Mode::Filter;
    let border = if editing {
        app.theme.warning
    } else {
        app.theme.border
    };

    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let scroll = app.filter.visual_scroll(inner_width);

    let text = if app.filter.value().is_empty() && !editing {
        Span::styled("press / to search", Style::default().fg(app.theme.border))
    } else {
        Span::raw(app.filter.value())
    };

    let search = Paragraph::new(text)
        .scroll((0, scroll as u16))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search")
                .border_style(Style::default().fg(border)),
        );
    frame.render_widget(search, area);

    if editing {
        let cursor = app.filter.visual_cursor().saturating_sub(scroll) as u16;
        frame.set_cursor(area.x + 1 + cursor, area.y + 1);
    }
}
