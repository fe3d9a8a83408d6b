use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::tui::{
    app::{App, Mode, Screen},
    components, screens,
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(frame.size());

    components::header::render(frame, chunks[0], app);

    match app.screen {
        Screen::Dashboard => screens::dashboard::render(frame, chunks[1], app),
        Screen::Applications => screens::applications::render(frame, chunks[1], app),
        Screen::Payout => screens::payout::render(frame, chunks[1], app),
        Screen::Reports => screens::reports::render(frame, chunks[1], app),
        Screen::Settings => screens::settings::render(frame, chunks[1], app),
    }

    render_status_bar(frame, chunks[2], app);

    match app.mode {
        Mode::Details => components::details::render(frame, app),
        Mode::Form => components::approval_form::render(frame, app),
        Mode::Help => {
            let area = centered_rect(60, 24, frame.size());
            components::help::render(frame, area, app);
        }
        Mode::Normal | Mode::Filter | Mode::PayoutLabel => {}
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let busy = if app.is_busy() {
        format!("{} ", SPINNER[app.tick % SPINNER.len()])
    } else {
        String::new()
    };

    let text = Line::from(vec![
        Span::styled(
            format!(" {} ", app.screen.title()),
            Style::default()
                .fg(Color::Black)
                .bg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(busy, Style::default().fg(app.theme.warning)),
        Span::styled(
            app.status_message.clone(),
            Style::default().fg(app.theme.muted),
        ),
        Span::raw(" | "),
        Span::styled("?: Help", Style::default().fg(app.theme.warning)),
        Span::raw(" | "),
        Span::styled("q: Quit", Style::default().fg(app.theme.error)),
    ]);

    let paragraph = Paragraph::new(text).block(Block::default().borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

/// `percent_x` of the width, `height` rows, centred in `area`
pub fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height - height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{fixtures::application, MockBursaryApi},
        config::Config,
        models::{session::staff_identity, ApplicationStatus},
        tui::{event::TaskResult, log::ActivityLog},
    };
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[test]
    fn test_every_screen_renders() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(
            Config::default(),
            staff_identity(),
            Arc::new(MockBursaryApi::new()),
            tx,
            ActivityLog::default(),
        );
        app.handle_task(TaskResult::Applications(Ok(vec![
            application("A1", ApplicationStatus::Pending),
            application("A2", ApplicationStatus::Approved),
        ])));

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        for screen in Screen::ALL {
            app.screen = screen;
            terminal.draw(|frame| render(frame, &app)).unwrap();
        }

        app.screen = Screen::Applications;
        app.mode = Mode::Help;
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Keybindings"));
    }

    #[test]
    fn test_centered_rect_fits_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 10, area);
        assert_eq!(popup.height, 10);
        assert_eq!(popup.y, 15);
        assert_eq!(popup.width, 60);

        let small = centered_rect(60, 50, Rect::new(0, 0, 80, 20));
        assert_eq!(small.height, 20);
    }
}
