use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem},
    Frame,
};

use crate::tui::app::App;

const KEYBINDINGS: [(&str, &str); 20] = [
    ("Tab / Shift+Tab", "Next / previous screen"),
    ("1-5", "Jump to screen"),
    ("r", "Reload applications"),
    ("? / Esc", "Toggle help"),
    ("q", "Quit"),
    ("", ""),
    ("↑↓ / j k", "Move through the page"),
    ("←→ / h l", "Previous / next page"),
    ("/", "Search; Esc clears"),
    ("s", "Cycle status filter"),
    ("Space", "Select pending row"),
    ("a / c", "Select all pending / clear"),
    ("d", "Approve or reject selection"),
    ("Enter", "Open details (d to decide)"),
    ("", ""),
    ("b / s / x", "Payout: batch label / send / discard"),
    ("k / f", "Reports: kind / disbursement status"),
    ("l", "Reports: load"),
    ("x / c / p", "Reports: export XLSX / CSV / PDF"),
    ("Tab, ←→, Enter", "Form: field, toggle, submit"),
];

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = KEYBINDINGS
        .iter()
        .map(|(key, desc)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:18}", key), app.theme.key()),
                Span::raw(if key.is_empty() { "" } else { " - " }),
                Span::styled(*desc, Style::default().fg(app.theme.foreground)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Keybindings")
            .border_style(Style::default().fg(app.theme.primary)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(list, area);
}
