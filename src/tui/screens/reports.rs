use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::{reports::ReportKind, tui::app::App, utils::truncate};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    render_options(frame, chunks[0], app);
    render_preview(frame, chunks[1], app);
}

fn render_options(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let status = match app.report_kind {
        ReportKind::Applications => "n/a".to_string(),
        ReportKind::Disbursements => app.report_status.unwrap_or("All").to_string(),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("k", theme.key()),
            Span::raw(" Report: "),
            Span::styled(app.report_kind.title(), theme.title()),
            Span::raw("    "),
            Span::styled("f", theme.key()),
            Span::raw(" Status: "),
            Span::styled(status, Style::default().fg(theme.foreground)),
        ]),
        Line::from(vec![
            Span::styled("l", theme.key()),
            Span::raw(" load   "),
            Span::styled("x", theme.key()),
            Span::raw(" XLSX   "),
            Span::styled("c", theme.key()),
            Span::raw(" CSV   "),
            Span::styled("p", theme.key()),
            Span::raw(format!(" PDF   into {}", app.export_dir.display())),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Export")
            .border_style(Style::default().fg(theme.primary)),
    );
    frame.render_widget(paragraph, area);
}

fn render_preview(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let Some(table) = &app.report else {
        let hint = Paragraph::new(Span::styled(
            "No report loaded",
            Style::default().fg(theme.muted),
        ))
        .block(Block::default().borders(Borders::ALL).title("Preview"));
        frame.render_widget(hint, area);
        return;
    };

    let columns = table.columns.len().max(1);
    let cell_width = (area.width.saturating_sub(2) as usize / columns).max(4);

    let header = Row::new(
        table
            .columns
            .iter()
            .map(|c| Cell::from(truncate(c, cell_width)).style(Style::default().fg(theme.warning))),
    )
    .style(Style::default().add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let visible = area.height.saturating_sub(4) as usize;
    let rows: Vec<Row> = table
        .rows
        .iter()
        .take(visible)
        .map(|row| Row::new(row.iter().map(|value| Cell::from(truncate(value, cell_width)))))
        .collect();

    let widths = vec![Constraint::Ratio(1, columns as u32); columns];
    let title = format!("{} ({} row(s))", table.title(), table.len());

    let preview = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(theme.primary)),
    );
    frame.render_widget(preview, area);
}
