//! Interactive dashboard. Key handling and state live in [`app`]; rendering is
//! split into reusable components and one module per screen.

pub mod app;
pub mod components;
pub mod event;
pub mod form;
pub mod log;
pub mod screens;
pub mod theme;
pub mod ui;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc, time::Duration};
use tracing::info;

use crate::{api::BursaryApi, config::Config, error::Result, models::Identity};

pub use app::App;
pub use log::{ActivityLog, LogLevel};

use event::{Event, EventHandler};

const TICK_RATE: Duration = Duration::from_millis(250);

type Backend = CrosstermBackend<io::Stdout>;

pub async fn run(
    config: Config,
    identity: Identity,
    api: Arc<dyn BursaryApi>,
    activity: ActivityLog,
) -> Result<()> {
    let mut terminal = setup_terminal()?;

    let result = event_loop(&mut terminal, config, identity, api, activity).await;

    // Restore the terminal even when the loop failed
    let restored = restore_terminal(&mut terminal);
    result?;
    restored?;
    Ok(())
}

async fn event_loop(
    terminal: &mut Terminal<Backend>,
    config: Config,
    identity: Identity,
    api: Arc<dyn BursaryApi>,
    activity: ActivityLog,
) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);
    let mut app = App::new(config, identity, api, events.sender(), activity);

    info!("Dashboard opened for {}", app.identity.display_name);
    app.refresh();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, &app))?;

        match events.next().await {
            Some(Event::Key(key)) => app.handle_key(key),
            Some(Event::Tick) => app.on_tick(),
            Some(Event::Resize(_, _)) => {}
            Some(Event::Task(result)) => app.handle_task(result),
            None => break,
        }
    }

    Ok(())
}

fn setup_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
