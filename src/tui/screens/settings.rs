use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::{approval::ExecutionPolicy, tui::app::App};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let config = &app.config;
    let policy = match config.approval.policy {
        ExecutionPolicy::Sequential => "sequential".to_string(),
        ExecutionPolicy::BoundedParallel { max_in_flight } => {
            format!("bounded parallel ({} in flight)", max_in_flight)
        }
    };

    let settings = vec![
        ("Bursary API", config.api.base_url.clone()),
        ("Payout API", config.api.payout_base_url.clone()),
        ("Auth API", config.api.auth_base_url.clone()),
        ("Timeout", format!("{}s", config.api.timeout_secs)),
        ("Approval policy", policy),
        ("Page size", config.listing.page_size.to_string()),
        ("Payout currency", config.payout.currency.to_string()),
        ("Amount divisor", config.payout.minor_unit_divisor.to_string()),
        (
            "Payout receiver",
            config
                .payout
                .receiver_override
                .clone()
                .unwrap_or_else(|| "applicant email".to_string()),
        ),
        ("Session store", config.database.path.clone()),
    ];
    render_list(frame, chunks[0], app, "Configuration", settings);

    let identity = &app.identity;
    let account = vec![
        ("Name", identity.display_name.clone()),
        ("Role", identity.role.to_string()),
        ("Phone", identity.phone.clone()),
        ("Email", identity.email.clone()),
        ("National ID", identity.national_id.clone()),
    ];
    render_list(frame, chunks[1], app, "Signed in", account);
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    title: &str,
    entries: Vec<(&str, String)>,
) {
    let items: Vec<ListItem> = entries
        .into_iter()
        .map(|(key, value)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:16}", key), Style::default().fg(app.theme.warning)),
                Span::raw(": "),
                Span::styled(value, Style::default().fg(app.theme.foreground)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Style::default().fg(app.theme.primary)),
    );

    frame.render_widget(list, area);
}
