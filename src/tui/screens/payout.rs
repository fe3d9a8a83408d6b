use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::tui::app::{App, Mode};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Batch label
            Constraint::Length(3), // Summary
            Constraint::Min(0),    // Items
        ])
        .split(area);

    render_label(frame, chunks[0], app);
    render_summary(frame, chunks[1], app);
    render_items(frame, chunks[2], app);
}

fn render_label(frame: &mut Frame, area: Rect, app: &App) {
    let editing = app.mode == Mode::PayoutLabel;
    let border = if editing {
        app.theme.warning
    } else {
        app.theme.border
    };

    let text = if app.payout_label.value().is_empty() && !editing {
        Span::styled("press b to enter a batch number", Style::default().fg(app.theme.border))
    } else {
        Span::raw(app.payout_label.value())
    };

    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Batch number")
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(paragraph, area);

    if editing {
        let width = area.width.saturating_sub(2).max(1) as usize;
        let scroll = app.payout_label.visual_scroll(width);
        let cursor = app.payout_label.visual_cursor().saturating_sub(scroll) as u16;
        frame.set_cursor(area.x + 1 + cursor, area.y + 1);
    }
}

fn render_summary(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let line = match (&app.payout_preview, &app.payout_result) {
        (Some(request), _) => {
            let total: f64 = request
                .items
                .iter()
                .filter_map(|item| item.amount.value.parse::<f64>().ok())
                .sum();
            Line::from(vec![
                Span::styled(
                    request.sender_batch_header.sender_batch_id.clone(),
                    theme.title(),
                ),
                Span::raw(format!(
                    "  {} item(s), {:.2} {}  ",
                    request.items.len(),
                    total,
                    app.config.payout.currency
                )),
                Span::styled("s", theme.key()),
                Span::raw(" send  "),
                Span::styled("x", theme.key()),
                Span::raw(" discard"),
            ])
        }
        (None, Some(result)) => Line::from(Span::styled(
            result.clone(),
            Style::default()
                .fg(theme.success)
                .add_modifier(Modifier::BOLD),
        )),
        (None, None) => Line::from(Span::styled(
            "Only approved applications in the batch are paid",
            Style::default().fg(theme.muted),
        )),
    };

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Payout")
            .border_style(Style::default().fg(theme.primary)),
    );
    frame.render_widget(paragraph, area);
}

fn render_items(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let header = Row::new(
        ["Item", "Receiver", "Amount", "Note"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(theme.warning))),
    )
    .style(Style::default().add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let rows: Vec<Row> = app
        .payout_preview
        .iter()
        .flat_map(|request| request.items.iter())
        .map(|item| {
            Row::new(vec![
                Cell::from(item.sender_item_id.clone()),
                Cell::from(item.receiver.clone()),
                Cell::from(format!("{} {}", item.amount.currency, item.amount.value)),
                Cell::from(item.note.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(20),
        Constraint::Percentage(30),
        Constraint::Percentage(15),
        Constraint::Percentage(35),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Items")
            .border_style(Style::default().fg(theme.primary)),
    );

    frame.render_widget(table, area);
}
