use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::tui::{app::App, form::FormField, ui::centered_rect};

const LABEL_WIDTH: u16 = 18;

pub fn render(frame: &mut Frame, app: &App) {
    let Some(form) = app.form.as_ref() else {
        return;
    };
    let theme = &app.theme;

    let area = centered_rect(60, 16, frame.size());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {} ", form.title()), theme.title()))
        .border_style(Style::default().fg(theme.primary));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(2),
            Constraint::Length(1),
        ])
        .split(inner);

    for (row, field) in form.fields().into_iter().enumerate() {
        let area = chunks[row];
        let focused = form.focus == field;
        let enabled = form.is_enabled(field);

        let label_style = if focused {
            theme.key()
        } else if enabled {
            Style::default().fg(theme.foreground)
        } else {
            Style::default().fg(theme.border)
        };

        let value = if enabled {
            form.value(field)
        } else {
            "-".to_string()
        };
        let value = match field {
            FormField::Disposition | FormField::Currency if enabled => format!("◀ {} ▶", value),
            _ => value,
        };

        let value_style = match field {
            FormField::Disposition => Style::default()
                .fg(theme.status(form.disposition.status()))
                .add_modifier(Modifier::BOLD),
            _ => Style::default().fg(theme.foreground),
        };

        let line = Line::from(vec![
            Span::styled(format!("{:width$}", field.label(), width = LABEL_WIDTH as usize), label_style),
            Span::styled(value, value_style),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        if focused {
            if let Some(input) = form.focused_input() {
                let width = area.width.saturating_sub(LABEL_WIDTH).max(1) as usize;
                let scroll = input.visual_scroll(width);
                let cursor = input.visual_cursor().saturating_sub(scroll) as u16;
                frame.set_cursor(area.x + LABEL_WIDTH + cursor, area.y);
            }
        }
    }

    if let Some(error) = &form.error {
        let message = Paragraph::new(Span::styled(error.clone(), Style::default().fg(theme.error)))
            .wrap(Wrap { trim: true });
        frame.render_widget(message, chunks[6]);
    }

    let hint = Line::from(vec![
        Span::styled("Tab", theme.key()),
        Span::raw(" field  "),
        Span::styled("←→", theme.key()),
        Span::raw(" toggle  "),
        Span::styled("Enter", theme.key()),
        Span::raw(" submit  "),
        Span::styled("Esc", theme.key()),
        Span::raw(" cancel"),
    ]);
    frame.render_widget(Paragraph::new(hint), chunks[7]);
}
