use chrono::Utc;
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use std::{future::Future, io::Write, path::PathBuf, sync::Arc};
use tokio::sync::mpsc::UnboundedSender;
use tui_input::{backend::crossterm::EventHandler as _, Input};

use crate::{
    analytics::DashboardStats,
    api::{BursaryApi, PayoutRequest},
    approval::{
        load_details, submit_decision, ApplicationDetails, BatchApprovalProcessor, BatchOutcome,
        Selection,
    },
    config::Config,
    error::BursaryError,
    listing::{self, Page, StatusFilter},
    models::{Application, Identity},
    payout,
    reports::{self, ExportFormat, ReportKind, ReportTable, DISBURSEMENT_STATUSES},
    tui::{
        event::{Event, TaskResult},
        form::{FormState, FormTarget},
        log::{ActivityLog, LogLevel},
        theme::Theme,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Applications,
    Payout,
    Reports,
    Settings,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::Dashboard,
        Screen::Applications,
        Screen::Payout,
        Screen::Reports,
        Screen::Settings,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::Applications => "Applications",
            Screen::Payout => "Payout",
            Screen::Reports => "Reports",
            Screen::Settings => "Settings",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Which widget receives key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Filter,
    Form,
    Details,
    PayoutLabel,
    Help,
}

pub struct App {
    // UI state
    pub screen: Screen,
    pub mode: Mode,
    pub should_quit: bool,
    pub status_message: String,
    pub pending_tasks: usize,
    pub tick: usize,
    pub theme: Theme,

    // Session
    pub config: Config,
    pub identity: Identity,
    api: Arc<dyn BursaryApi>,
    events: UnboundedSender<Event>,
    pub activity: ActivityLog,

    // Applications
    pub applications: Vec<Application>,
    pub stats: DashboardStats,
    pub filter: Input,
    pub status_filter: StatusFilter,
    pub page: usize,
    pub cursor: usize,
    pub selection: Selection,
    pub form: Option<FormState>,
    pub details: Option<ApplicationDetails>,

    // Payout
    pub payout_label: Input,
    pub payout_preview: Option<PayoutRequest>,
    pub payout_result: Option<String>,

    // Reports
    pub report_kind: ReportKind,
    pub report_status: Option<&'static str>,
    pub report: Option<ReportTable>,
    pub export_dir: PathBuf,
}

impl App {
    pub fn new(
        config: Config,
        identity: Identity,
        api: Arc<dyn BursaryApi>,
        events: UnboundedSender<Event>,
        activity: ActivityLog,
    ) -> Self {
        Self {
            screen: Screen::Dashboard,
            mode: Mode::Normal,
            should_quit: false,
            status_message: "Ready".to_string(),
            pending_tasks: 0,
            tick: 0,
            theme: Theme::default(),
            config,
            identity,
            api,
            events,
            activity,
            applications: Vec::new(),
            stats: DashboardStats::default(),
            filter: Input::default(),
            status_filter: StatusFilter::All,
            page: 1,
            cursor: 0,
            selection: Selection::new(),
            form: None,
            details: None,
            payout_label: Input::default(),
            payout_preview: None,
            payout_result: None,
            report_kind: ReportKind::Applications,
            report_status: None,
            report: None,
            export_dir: PathBuf::from("."),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending_tasks > 0
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    // Listing

    pub fn visible(&self) -> Vec<&Application> {
        listing::filter(&self.applications, self.filter.value(), self.status_filter)
    }

    pub fn current_page(&self) -> Page<'_> {
        listing::paginate(&self.visible(), self.page, self.config.listing.page_size)
    }

    pub fn highlighted(&self) -> Option<&Application> {
        self.current_page().items.get(self.cursor).copied()
    }

    fn set_applications(&mut self, applications: Vec<Application>) {
        self.stats = DashboardStats::from_applications(&applications);
        self.applications = applications;

        // Anything no longer pending drops out of the selection
        let stale: Vec<_> = self
            .selection
            .ids()
            .iter()
            .filter(|id| {
                !self
                    .applications
                    .iter()
                    .any(|app| &app.id == *id && app.is_pending())
            })
            .cloned()
            .collect();
        for id in &stale {
            self.selection.deselect(id);
        }

        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let page = self.current_page();
        let len = page.items.len();
        let number = page.number;
        self.page = number;
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    fn reset_paging(&mut self) {
        self.page = 1;
        self.cursor = 0;
    }

    // Background work

    fn spawn<F>(&mut self, label: impl Into<String>, task: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        self.pending_tasks += 1;
        self.status_message = format!("{}...", label.into());

        let events = self.events.clone();
        tokio::spawn(async move {
            let result = task.await;
            let _ = events.send(Event::Task(result));
        });
    }

    pub fn refresh(&mut self) {
        let scope = match self.identity.list_scope() {
            Ok(scope) => scope,
            Err(e) => {
                self.log(LogLevel::Error, e.to_string());
                return;
            }
        };

        let api = Arc::clone(&self.api);
        self.spawn("Loading applications", async move {
            TaskResult::Applications(api.list_applications(&scope).await)
        });
    }

    pub fn handle_task(&mut self, result: TaskResult) {
        self.pending_tasks = self.pending_tasks.saturating_sub(1);

        match result {
            TaskResult::Applications(Ok(applications)) => {
                let count = applications.len();
                self.set_applications(applications);
                self.log(LogLevel::Info, format!("Loaded {} application(s)", count));
            }
            TaskResult::Applications(Err(e)) => {
                self.log(LogLevel::Error, format!("Failed to load applications: {}", e));
            }
            TaskResult::Batch(outcome) => self.apply_outcome(&outcome, true),
            TaskResult::Details(Ok(details)) => {
                self.details = Some(details);
                self.mode = Mode::Details;
                self.status_message = "Details loaded".to_string();
            }
            TaskResult::Details(Err(e)) => self.log(LogLevel::Error, e.to_string()),
            TaskResult::Decision(Ok(decision)) => {
                if decision.batch.is_complete_success() {
                    for result in &decision.batch.results {
                        self.selection.deselect(&result.id);
                    }
                }
                self.apply_outcome(&decision.batch, false);
                match decision.reloaded {
                    Ok(details) => self.details = Some(details),
                    Err(e) => self.log(LogLevel::Warning, e),
                }
            }
            TaskResult::Decision(Err(e)) => {
                self.log(LogLevel::Error, format!("Decision failed: {}", e));
            }
            TaskResult::PayoutPrepared(Ok(request)) => {
                self.log(
                    LogLevel::Info,
                    format!(
                        "Payout of {} item(s) ready; press s to send",
                        request.items.len()
                    ),
                );
                self.payout_preview = Some(request);
                self.payout_result = None;
            }
            TaskResult::PayoutPrepared(Err(e)) => {
                self.payout_preview = None;
                let level = match e {
                    BursaryError::NothingToPay(_) => LogLevel::Warning,
                    _ => LogLevel::Error,
                };
                self.log(level, e.to_string());
            }
            TaskResult::PayoutSent(Ok(response)) => {
                let header = response.batch_header;
                let message = format!(
                    "Payout {} submitted ({})",
                    header.payout_batch_id, header.batch_status
                );
                ring_bell();
                self.payout_preview = None;
                self.payout_result = Some(message.clone());
                self.log(LogLevel::Success, message);
            }
            TaskResult::PayoutSent(Err(e)) => {
                self.log(LogLevel::Error, format!("Payout failed: {}", e));
            }
            TaskResult::Report(Ok(table)) => {
                self.log(
                    LogLevel::Info,
                    format!("{} loaded with {} row(s)", table.title(), table.len()),
                );
                self.report = Some(table);
            }
            TaskResult::Report(Err(e)) => {
                self.log(LogLevel::Error, format!("Report failed: {}", e));
            }
            TaskResult::Export(Ok(Some(path))) => {
                ring_bell();
                self.log(LogLevel::Success, format!("Exported {}", path.display()));
            }
            TaskResult::Export(Ok(None)) => {
                self.log(LogLevel::Warning, "Report has no rows; nothing exported");
            }
            TaskResult::Export(Err(e)) => {
                self.log(LogLevel::Error, format!("Export failed: {}", e));
            }
        }
    }

    fn apply_outcome(&mut self, outcome: &BatchOutcome, settle_selection: bool) {
        if let Some(applications) = outcome.refreshed() {
            self.set_applications(applications.to_vec());
        }
        if let Some(error) = outcome.refresh_error() {
            self.log(LogLevel::Warning, error.to_string());
        }
        for error in outcome.errors() {
            self.log(LogLevel::Error, error);
        }

        let complete = if settle_selection {
            outcome.settle(&mut self.selection)
        } else {
            outcome.is_complete_success()
        };

        let summary = outcome.summary_message();
        let headline = summary.lines().next().unwrap_or_default().to_string();
        if complete {
            ring_bell();
            self.log(LogLevel::Success, headline);
        } else {
            self.log(LogLevel::Warning, headline);
        }
    }

    // Keys

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.mode {
            Mode::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                    self.mode = Mode::Normal;
                }
            }
            Mode::Filter => self.handle_filter_key(key),
            Mode::Form => self.handle_form_key(key),
            Mode::Details => self.handle_details_key(key),
            Mode::PayoutLabel => self.handle_payout_label_key(key),
            Mode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.screen = self.screen.next(),
            KeyCode::BackTab => self.screen = self.screen.previous(),
            KeyCode::Char('?') => self.mode = Mode::Help,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.screen = Screen::ALL[index];
            }
            _ => match self.screen {
                Screen::Applications => self.handle_applications_key(key),
                Screen::Payout => self.handle_payout_key(key),
                Screen::Reports => self.handle_reports_key(key),
                Screen::Dashboard | Screen::Settings => {}
            },
        }
    }

    fn handle_applications_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.current_page().items.len();
                if self.cursor + 1 < len {
                    self.cursor += 1;
                }
            }
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('h') => {
                if self.current_page().has_previous() {
                    self.page -= 1;
                    self.cursor = 0;
                }
            }
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char('l') => {
                if self.current_page().has_next() {
                    self.page += 1;
                    self.cursor = 0;
                }
            }
            KeyCode::Char('/') => self.mode = Mode::Filter,
            KeyCode::Char('s') => {
                self.status_filter = self.status_filter.next();
                self.reset_paging();
            }
            KeyCode::Char(' ') => self.toggle_highlighted(),
            KeyCode::Char('a') => self.select_all_pending(),
            KeyCode::Char('c') => {
                self.selection.clear();
                self.status_message = "Selection cleared".to_string();
            }
            KeyCode::Char('d') => self.open_selection_form(),
            KeyCode::Enter => self.open_details(),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.mode = Mode::Normal,
            KeyCode::Esc => {
                self.filter.reset();
                self.reset_paging();
                self.mode = Mode::Normal;
            }
            _ => {
                if self.filter.handle_event(&CrosstermEvent::Key(key)).is_some() {
                    self.reset_paging();
                }
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            self.mode = Mode::Normal;
            return;
        };

        match key.code {
            KeyCode::Esc => {
                let back_to_details = matches!(form.target, FormTarget::Details(_));
                self.form = None;
                self.mode = if back_to_details {
                    Mode::Details
                } else {
                    Mode::Normal
                };
            }
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if !form.focus_is_text() => {
                form.toggle()
            }
            _ => {
                form.input(key);
            }
        }
    }

    fn handle_details_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.details = None;
                self.mode = Mode::Normal;
            }
            KeyCode::Char('d') => {
                if let Err(e) = self.identity.require_staff("Deciding an application") {
                    self.log(LogLevel::Warning, e.to_string());
                    return;
                }
                if let Some(details) = self.details.clone() {
                    self.form = Some(FormState::for_details(details));
                    self.mode = Mode::Form;
                }
            }
            _ => {}
        }
    }

    fn handle_payout_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('b') | KeyCode::Char('/') | KeyCode::Enter => {
                self.mode = Mode::PayoutLabel;
            }
            KeyCode::Char('s') => self.send_payout(),
            KeyCode::Char('x') => {
                self.payout_preview = None;
                self.status_message = "Payout discarded".to_string();
            }
            _ => {}
        }
    }

    fn handle_payout_label_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                self.prepare_payout();
            }
            _ => {
                self.payout_label.handle_event(&CrosstermEvent::Key(key));
            }
        }
    }

    fn handle_reports_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('k') => {
                self.report_kind = self.report_kind.toggle();
                self.report = None;
            }
            KeyCode::Char('f') => {
                self.report_status = next_disbursement_status(self.report_status);
                self.report = None;
            }
            KeyCode::Char('l') | KeyCode::Enter => self.load_report(),
            KeyCode::Char('x') => self.export_report(ExportFormat::Xlsx),
            KeyCode::Char('c') => self.export_report(ExportFormat::Csv),
            KeyCode::Char('p') => self.export_report(ExportFormat::Pdf),
            _ => {}
        }
    }

    // Selection and decisions

    fn toggle_highlighted(&mut self) {
        if let Err(e) = self.identity.require_staff("Selecting applications") {
            self.log(LogLevel::Warning, e.to_string());
            return;
        }
        let Some(application) = self.highlighted().cloned() else {
            return;
        };

        match self.selection.toggle(&application) {
            Ok(selected) => {
                self.status_message = format!(
                    "{} {} ({} selected)",
                    if selected { "Selected" } else { "Deselected" },
                    application.applicant_full_name,
                    self.selection.len()
                );
            }
            Err(e) => self.log(LogLevel::Warning, e.to_string()),
        }
    }

    fn select_all_pending(&mut self) {
        if let Err(e) = self.identity.require_staff("Selecting applications") {
            self.log(LogLevel::Warning, e.to_string());
            return;
        }
        let visible: Vec<Application> = self.visible().into_iter().cloned().collect();
        self.selection.select_all_pending(&visible);
        self.status_message = format!("{} application(s) selected", self.selection.len());
    }

    fn open_selection_form(&mut self) {
        if let Err(e) = self.identity.require_staff("Deciding applications") {
            self.log(LogLevel::Warning, e.to_string());
            return;
        }
        if self.selection.is_empty() {
            self.log(
                LogLevel::Warning,
                "Select at least one pending application (space)",
            );
            return;
        }
        self.form = Some(FormState::for_selection(self.selection.len()));
        self.mode = Mode::Form;
    }

    fn open_details(&mut self) {
        let Some(id) = self.highlighted().map(|app| app.id.clone()) else {
            return;
        };
        let api = Arc::clone(&self.api);
        self.spawn(format!("Loading {}", id), async move {
            TaskResult::Details(load_details(api.as_ref(), &id).await)
        });
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };

        let built = match form.build() {
            Ok(built) => built,
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };
        let approval = match built.resolve(&self.identity, Utc::now()) {
            Ok(approval) => approval,
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };
        let target = form.target.clone();
        self.form = None;

        let api = Arc::clone(&self.api);
        let policy = self.config.approval.policy;

        match target {
            FormTarget::Selection(_) => {
                self.mode = Mode::Normal;
                let ids = self.selection.ids().to_vec();
                let snapshot = self.applications.clone();
                let scope = match self.identity.list_scope() {
                    Ok(scope) => scope,
                    Err(e) => {
                        self.log(LogLevel::Error, e.to_string());
                        return;
                    }
                };

                self.spawn(format!("Submitting {} decision(s)", ids.len()), async move {
                    let processor = BatchApprovalProcessor::new(api.as_ref(), policy);
                    TaskResult::Batch(processor.run(&approval, &ids, &snapshot, &scope).await)
                });
            }
            FormTarget::Details(details) => {
                self.mode = Mode::Details;
                let identity = self.identity.clone();
                self.spawn("Submitting decision", async move {
                    TaskResult::Decision(
                        submit_decision(api.as_ref(), policy, &identity, &details, &built).await,
                    )
                });
            }
        }
    }

    // Payout

    fn prepare_payout(&mut self) {
        let label = self.payout_label.value().trim().to_string();
        let api = Arc::clone(&self.api);
        let identity = self.identity.clone();
        let config = self.config.payout.clone();

        self.spawn(format!("Preparing payout for {}", label), async move {
            TaskResult::PayoutPrepared(
                payout::prepare(api.as_ref(), &identity, &label, &config, Utc::now()).await,
            )
        });
    }

    fn send_payout(&mut self) {
        let Some(request) = self.payout_preview.clone() else {
            self.log(LogLevel::Warning, "Prepare a payout first (b)");
            return;
        };
        let api = Arc::clone(&self.api);
        self.spawn("Sending payout", async move {
            TaskResult::PayoutSent(payout::send(api.as_ref(), &request).await)
        });
    }

    // Reports

    fn load_report(&mut self) {
        let api = Arc::clone(&self.api);
        let identity = self.identity.clone();
        let kind = self.report_kind;
        let status = self.report_status;

        self.spawn(format!("Loading {} report", kind.title()), async move {
            TaskResult::Report(reports::load_report(api.as_ref(), &identity, kind, status).await)
        });
    }

    fn export_report(&mut self, format: ExportFormat) {
        let Some(table) = self.report.clone() else {
            self.log(LogLevel::Warning, "Load a report first (l)");
            return;
        };
        let dir = self.export_dir.clone();

        self.spawn(format!("Exporting {}", table.title()), async move {
            let written = tokio::task::spawn_blocking(move || {
                reports::export(&table, format, &dir, Utc::now())
            })
            .await
            .unwrap_or_else(|e| Err(BursaryError::Export(e.to_string())));
            TaskResult::Export(written)
        });
    }

    fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        self.status_message = message.clone();
        self.activity.push(level, message);
    }
}

/// None → Disbursed → Withheld → In Progress → None
fn next_disbursement_status(current: Option<&'static str>) -> Option<&'static str> {
    match current {
        None => DISBURSEMENT_STATUSES.first().copied(),
        Some(status) => DISBURSEMENT_STATUSES
            .iter()
            .position(|s| *s == status)
            .and_then(|i| DISBURSEMENT_STATUSES.get(i + 1))
            .copied(),
    }
}

fn ring_bell() {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(b"\x07");
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{fixtures::application, ApprovalResponse, MockBursaryApi};
    use crate::models::{
        session::{applicant_identity, staff_identity},
        ApplicationId, ApplicationStatus,
    };
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(
        api: MockBursaryApi,
        identity: Identity,
    ) -> (App, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut config = Config::default();
        config.listing.page_size = 2;
        let app = App::new(config, identity, Arc::new(api), tx, ActivityLog::default());
        (app, rx)
    }

    fn sample() -> Vec<Application> {
        vec![
            application("A1", ApplicationStatus::Pending),
            application("A2", ApplicationStatus::Approved),
            application("A3", ApplicationStatus::Pending),
        ]
    }

    fn loaded(identity: Identity) -> App {
        let (mut app, _rx) = app_with(MockBursaryApi::new(), identity);
        app.handle_task(TaskResult::Applications(Ok(sample())));
        app.screen = Screen::Applications;
        app
    }

    #[test]
    fn test_screens_cycle() {
        assert_eq!(Screen::Settings.next(), Screen::Dashboard);
        assert_eq!(Screen::Dashboard.previous(), Screen::Settings);
    }

    #[test]
    fn test_number_keys_jump_to_screen() {
        let mut app = loaded(staff_identity());
        app.handle_key(key(KeyCode::Char('4')));
        assert_eq!(app.screen, Screen::Reports);
    }

    #[test]
    fn test_loaded_list_updates_stats() {
        let app = loaded(staff_identity());
        assert_eq!(app.stats.total, 3);
        assert_eq!(app.stats.pending, 2);
        assert_eq!(app.current_page().total_pages, 2);
    }

    #[test]
    fn test_only_pending_rows_can_be_selected() {
        let mut app = loaded(staff_identity());

        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.selection.contains(&"A1".into()));

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.selection.len(), 1);
        assert!(!app.selection.contains(&"A2".into()));
    }

    #[test]
    fn test_applicant_cannot_select_or_decide() {
        let mut app = loaded(applicant_identity());

        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Char('a')));
        app.handle_key(key(KeyCode::Char('d')));

        assert!(app.selection.is_empty());
        assert!(app.form.is_none());
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_filter_typing_resets_paging() {
        let mut app = loaded(staff_identity());
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.page, 2);

        app.handle_key(key(KeyCode::Char('/')));
        for ch in "A3".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.page, 1);
        assert_eq!(app.visible().len(), 1);
        assert_eq!(app.highlighted().unwrap().id.as_str(), "A3");
    }

    #[test]
    fn test_status_filter_cycles_from_key() {
        let mut app = loaded(staff_identity());
        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.visible().len(), 2);
    }

    #[test]
    fn test_refresh_drops_processed_rows_from_selection() {
        let mut app = loaded(staff_identity());
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.selection.len(), 2);

        let mut refreshed = sample();
        refreshed[0].application_status = ApplicationStatus::Approved;
        app.handle_task(TaskResult::Applications(Ok(refreshed)));

        assert_eq!(app.selection.ids().to_vec(), vec![ApplicationId::new("A3")]);
    }

    #[test]
    fn test_decision_form_requires_a_selection() {
        let mut app = loaded(staff_identity());
        app.handle_key(key(KeyCode::Char('d')));
        assert!(app.form.is_none());

        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.mode, Mode::Form);

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.form.is_none());
    }

    #[test]
    fn test_invalid_form_stays_open() {
        let mut app = loaded(staff_identity());
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Char('d')));
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Form);
        assert!(app.form.as_ref().unwrap().error.is_some());
        assert_eq!(app.pending_tasks, 0);
    }

    #[tokio::test]
    async fn test_submitted_batch_clears_selection() {
        let mut api = MockBursaryApi::new();
        api.expect_submit_approval().times(2).returning(|_| {
            Ok(ApprovalResponse {
                success: true,
                message: None,
            })
        });
        api.expect_list_applications().times(1).returning(|_| {
            let mut apps = sample();
            apps[0].application_status = ApplicationStatus::Approved;
            apps[2].application_status = ApplicationStatus::Approved;
            Ok(apps)
        });

        let (mut app, mut rx) = app_with(api, staff_identity());
        app.handle_task(TaskResult::Applications(Ok(sample())));
        app.screen = Screen::Applications;

        app.handle_key(key(KeyCode::Char('a')));
        app.handle_key(key(KeyCode::Char('d')));
        app.handle_key(key(KeyCode::Tab));
        for ch in "5000".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert!(app.is_busy());

        let Some(Event::Task(result)) = rx.recv().await else {
            panic!("expected a task result");
        };
        app.handle_task(result);

        assert!(!app.is_busy());
        assert!(app.selection.is_empty());
        assert_eq!(app.stats.approved, 3);
        assert!(app
            .activity
            .entries()
            .iter()
            .any(|e| e.level == LogLevel::Success));
    }

    #[test]
    fn test_partial_failure_keeps_selection() {
        use crate::approval::{ItemErrorKind, ItemOutcome, ItemResult, RefreshOutcome};

        let mut app = loaded(staff_identity());
        app.handle_key(key(KeyCode::Char('a')));

        let outcome = BatchOutcome {
            batch_label: "B-1".to_string(),
            results: vec![
                ItemResult {
                    id: "A1".into(),
                    outcome: ItemOutcome::Success,
                },
                ItemResult {
                    id: "A3".into(),
                    outcome: ItemOutcome::Error {
                        kind: ItemErrorKind::Http,
                        detail: "server error".to_string(),
                    },
                },
            ],
            refresh: RefreshOutcome::Failed("processed but refresh failed: timeout".to_string()),
        };
        app.handle_task(TaskResult::Batch(outcome));

        assert_eq!(app.selection.len(), 2);
        let entries = app.activity.entries();
        assert!(entries.iter().any(|e| e.level == LogLevel::Error));
        assert!(entries
            .iter()
            .any(|e| e.message.contains("refresh failed")));
    }

    #[test]
    fn test_disbursement_status_cycle() {
        let mut status = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            status = next_disbursement_status(status);
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![Some("Disbursed"), Some("Withheld"), Some("In Progress"), None]
        );
    }

    #[test]
    fn test_export_without_report_warns() {
        let mut app = loaded(staff_identity());
        app.screen = Screen::Reports;
        app.handle_key(key(KeyCode::Char('c')));
        assert!(app.status_message.contains("Load a report first"));
    }

    #[tokio::test]
    async fn test_export_runs_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, mut rx) = app_with(MockBursaryApi::new(), staff_identity());
        app.export_dir = dir.path().to_path_buf();
        app.handle_task(TaskResult::Report(Ok(ReportTable::applications(&sample()))));
        app.screen = Screen::Reports;

        app.handle_key(key(KeyCode::Char('c')));
        assert!(app.is_busy());

        let Some(Event::Task(result)) = rx.recv().await else {
            panic!("expected a task result");
        };
        app.handle_task(result);

        assert!(!app.is_busy());
        assert!(app.status_message.starts_with("Exported"));
        assert!(dir.path().join("Bursary Applications.csv").exists());
    }

    #[tokio::test]
    async fn test_decision_reload_failure_keeps_details_open() {
        let (mut app, _rx) = app_with(MockBursaryApi::new(), staff_identity());
        app.handle_task(TaskResult::Applications(Ok(sample())));
        let details = ApplicationDetails {
            application: application("A1", ApplicationStatus::Pending),
            status: ApplicationStatus::Pending,
            batch_label: String::new(),
            allocation: crate::models::Money::zero_kes(),
            remark: String::new(),
            approver: None,
            approved_date: None,
        };
        app.details = Some(details.clone());
        app.mode = Mode::Details;
        app.selection.toggle(&sample()[0]).unwrap();

        let batch = BatchOutcome {
            batch_label: "BATCH-1".to_string(),
            results: vec![crate::approval::ItemResult {
                id: ApplicationId::new("A1"),
                outcome: crate::approval::ItemOutcome::Success,
            }],
            refresh: crate::approval::RefreshOutcome::Refreshed(sample()),
        };
        app.handle_task(TaskResult::Decision(Ok(crate::approval::DecisionOutcome {
            batch,
            reloaded: Err("processed but refresh failed: API error (503)".to_string()),
        })));

        assert_eq!(app.details, Some(details));
        assert!(app.status_message.starts_with("processed but refresh failed"));
        assert!(app.selection.is_empty());
    }
}
