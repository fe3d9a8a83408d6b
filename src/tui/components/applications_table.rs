use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::{
    models::Application,
    tui::app::App,
    utils::{format_amount, truncate},
};

/// Rows of `items`, marking selected ids. `highlight` is the cursor row.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    title: &str,
    items: &[&Application],
    highlight: Option<usize>,
) {
    let theme = &app.theme;

    let header_cells = ["", "Name", "Admission", "School", "Year", "Amount", "Status", "Batch"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(theme.warning)));

    let header = Row::new(header_cells)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .height(1)
        .bottom_margin(1);

    let rows = items.iter().map(|application| {
        let mark = if app.selection.contains(&application.id) {
            "[x]"
        } else if application.is_pending() && app.identity.is_staff() {
            "[ ]"
        } else {
            ""
        };

        let status = application.application_status;
        Row::new(vec![
            Cell::from(mark).style(Style::default().fg(theme.primary)),
            Cell::from(truncate(&application.applicant_full_name, 24)),
            Cell::from(application.admission_number.clone()),
            Cell::from(truncate(&application.school_name, 20)),
            Cell::from(application.year_of_study.clone()),
            Cell::from(format!(
                "{} {}",
                application.amount_applied_for.currency,
                format_amount(application.amount_applied_for.amount)
            )),
            Cell::from(status.as_str()).style(Style::default().fg(theme.status(status))),
            Cell::from(application.batch_label().unwrap_or("-").to_string()),
        ])
        .height(1)
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Percentage(22),
        Constraint::Percentage(13),
        Constraint::Percentage(18),
        Constraint::Length(4),
        Constraint::Percentage(14),
        Constraint::Length(9),
        Constraint::Min(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .border_style(Style::default().fg(theme.primary)),
        )
        .highlight_style(theme.highlight())
        .highlight_symbol(">> ");

    let mut state = TableState::default();
    state.select(highlight);

    frame.render_stateful_widget(table, area, &mut state);
}
