use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

use crate::{
    approval::{ApplicationDetails, BatchOutcome, DecisionOutcome},
    api::{PayoutRequest, PayoutResponse},
    error::Result,
    models::Application,
    reports::ReportTable,
};

/// Results of background requests, delivered through the event channel
pub enum TaskResult {
    Applications(Result<Vec<Application>>),
    Batch(BatchOutcome),
    Details(Result<ApplicationDetails>),
    Decision(Result<DecisionOutcome>),
    PayoutPrepared(Result<PayoutRequest>),
    PayoutSent(Result<PayoutResponse>),
    Report(Result<ReportTable>),
    Export(Result<Option<PathBuf>>),
}

pub enum Event {
    /// Terminal tick
    Tick,
    /// Key press
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// A background request finished
    Task(TaskResult),
}

pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let input = sender.clone();

        // crossterm polling blocks, so it gets its own thread; it stops once
        // the receiver is gone
        tokio::task::spawn_blocking(move || {
            let mut last_tick = Instant::now();

            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::ZERO);

                match event::poll(timeout) {
                    Ok(true) => {
                        let forwarded = match event::read() {
                            Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                                input.send(Event::Key(key))
                            }
                            Ok(CrosstermEvent::Resize(width, height)) => {
                                input.send(Event::Resize(width, height))
                            }
                            Ok(_) => Ok(()),
                            Err(_) => break,
                        };
                        if forwarded.is_err() {
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(_) => break,
                }

                if last_tick.elapsed() >= tick_rate {
                    if input.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { sender, receiver }
    }

    /// For background tasks to report back on
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}
