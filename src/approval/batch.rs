use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::{
    api::BursaryApi,
    approval::{form::ResolvedApproval, selection::Selection},
    error::BursaryError,
    models::{Application, ApplicationId, ListScope},
};

/// Substring the API uses when an approval record already exists
const DUPLICATE_APPROVAL_MARKER: &str = "uniqueness constraint violation";

pub const ALREADY_PROCESSED: &str = "already processed";
pub const NOT_FOUND: &str = "not found";

/// How item requests are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// One request at a time, in selection order
    Sequential,
    /// Up to `max_in_flight` requests at once; outcomes still reported in
    /// selection order
    BoundedParallel { max_in_flight: usize },
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        ExecutionPolicy::Sequential
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemErrorKind {
    /// Id missing from the last fetched list
    NotFound,
    /// Processed already, locally detected or reported by the API
    AlreadyProcessed,
    /// The API answered with its failure flag set
    Rejected,
    /// Non-success HTTP status
    Http,
    /// The request never got an answer
    Transport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Success,
    Error { kind: ItemErrorKind, detail: String },
}

impl ItemOutcome {
    fn error(kind: ItemErrorKind, detail: impl Into<String>) -> Self {
        ItemOutcome::Error {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Success)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemResult {
    pub id: ApplicationId,
    pub outcome: ItemOutcome,
}

impl fmt::Display for ItemResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            ItemOutcome::Success => write!(f, "{}: ok", self.id),
            ItemOutcome::Error { detail, .. } => write!(f, "{}: {}", self.id, detail),
        }
    }
}

/// Result of re-fetching the list after the loop
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Refreshed(Vec<Application>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub batch_label: String,
    pub results: Vec<ItemResult>,
    pub refresh: RefreshOutcome,
}

impl BatchOutcome {
    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.successful()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }

    /// One display string per failed item
    pub fn errors(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.outcome.is_success())
            .map(|r| r.to_string())
            .collect()
    }

    pub fn refreshed(&self) -> Option<&[Application]> {
        match &self.refresh {
            RefreshOutcome::Refreshed(apps) => Some(apps),
            RefreshOutcome::Failed(_) => None,
        }
    }

    pub fn refresh_error(&self) -> Option<&str> {
        match &self.refresh {
            RefreshOutcome::Refreshed(_) => None,
            RefreshOutcome::Failed(message) => Some(message),
        }
    }

    /// Text shown to the operator once the batch is done
    pub fn summary_message(&self) -> String {
        if self.is_complete_success() {
            format!(
                "{} application(s) processed successfully (batch {})",
                self.successful(),
                self.batch_label
            )
        } else {
            let mut message = format!(
                "{} succeeded, {} failed:",
                self.successful(),
                self.failed()
            );
            for error in self.errors() {
                message.push_str("\n  - ");
                message.push_str(&error);
            }
            message
        }
    }

    /// Clears the selection only when every item went through. Returns
    /// whether it did, so front ends know to signal completion.
    pub fn settle(&self, selection: &mut Selection) -> bool {
        if self.is_complete_success() {
            selection.clear();
            true
        } else {
            false
        }
    }
}

/// Turns one decision plus a selection into per-item approval requests
pub struct BatchApprovalProcessor<'a, A: BursaryApi + ?Sized> {
    api: &'a A,
    policy: ExecutionPolicy,
    observer: Option<Box<dyn Fn(&ItemResult) + Send + Sync + 'a>>,
}

impl<'a, A: BursaryApi + ?Sized> BatchApprovalProcessor<'a, A> {
    pub fn new(api: &'a A, policy: ExecutionPolicy) -> Self {
        Self {
            api,
            policy,
            observer: None,
        }
    }

    /// Called once per item as outcomes come in
    pub fn with_observer(mut self, observer: impl Fn(&ItemResult) + Send + Sync + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Process every selected id against `snapshot`, then re-fetch `scope`
    /// once. Items never abort each other and nothing is rolled back.
    pub async fn run(
        &self,
        approval: &ResolvedApproval,
        ids: &[ApplicationId],
        snapshot: &[Application],
        scope: &ListScope,
    ) -> BatchOutcome {
        info!(
            "Submitting {} for {} application(s) (batch {}, {:?})",
            approval.disposition,
            ids.len(),
            approval.batch_label,
            self.policy
        );

        let results: Vec<ItemResult> = match self.policy {
            ExecutionPolicy::Sequential => {
                let mut results = Vec::with_capacity(ids.len());
                for id in ids {
                    let result = self.process_item(approval, id, snapshot).await;
                    self.notify(&result);
                    results.push(result);
                }
                results
            }
            ExecutionPolicy::BoundedParallel { max_in_flight } => {
                let pending: Vec<_> = ids
                    .iter()
                    .map(|id| self.process_item(approval, id, snapshot))
                    .collect();
                stream::iter(pending)
                    .buffered(max_in_flight.max(1))
                    .inspect(|result| self.notify(result))
                    .collect::<Vec<_>>()
                    .await
            }
        };

        let refresh = match self.api.list_applications(scope).await {
            Ok(applications) => RefreshOutcome::Refreshed(applications),
            Err(e) => {
                warn!("Refresh after batch failed: {}", e);
                RefreshOutcome::Failed(format!("processed but refresh failed: {}", e))
            }
        };

        let outcome = BatchOutcome {
            batch_label: approval.batch_label.clone(),
            results,
            refresh,
        };

        info!(
            "Batch {} complete: {} successful, {} failed",
            outcome.batch_label,
            outcome.successful(),
            outcome.failed()
        );

        outcome
    }

    async fn process_item(
        &self,
        approval: &ResolvedApproval,
        id: &ApplicationId,
        snapshot: &[Application],
    ) -> ItemResult {
        let outcome = match snapshot.iter().find(|app| &app.id == id) {
            None => {
                warn!("Application {} is not in the current list", id);
                ItemOutcome::error(ItemErrorKind::NotFound, NOT_FOUND)
            }
            Some(app) if !app.is_pending() => {
                warn!("Application {} is already {}", id, app.application_status);
                ItemOutcome::error(ItemErrorKind::AlreadyProcessed, ALREADY_PROCESSED)
            }
            Some(app) => self.submit(approval, app).await,
        };

        ItemResult {
            id: id.clone(),
            outcome,
        }
    }

    /// Send one approval request and classify the answer
    pub async fn submit(&self, approval: &ResolvedApproval, application: &Application) -> ItemOutcome {
        let request = approval.request_for(application);

        match self.api.submit_approval(&request).await {
            Ok(response) if response.success => {
                info!("Application {} {}", application.id, approval.disposition);
                ItemOutcome::Success
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "the server reported a failure".to_string());
                classify(ItemErrorKind::Rejected, message)
            }
            Err(BursaryError::Api { message, .. }) => classify(ItemErrorKind::Http, message),
            Err(BursaryError::Http(e)) => classify(ItemErrorKind::Transport, e.to_string()),
            Err(other) => classify(ItemErrorKind::Transport, other.to_string()),
        }
    }

    fn notify(&self, result: &ItemResult) {
        if let Some(observer) = &self.observer {
            observer(result);
        }
    }
}

fn classify(kind: ItemErrorKind, message: String) -> ItemOutcome {
    if message.to_lowercase().contains(DUPLICATE_APPROVAL_MARKER) {
        ItemOutcome::error(ItemErrorKind::AlreadyProcessed, ALREADY_PROCESSED)
    } else {
        ItemOutcome::error(kind, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{fixtures::application, ApprovalResponse, MockBursaryApi};
    use crate::approval::form::ApprovalForm;
    use crate::models::{session::staff_identity, ApplicationStatus, Currency, Money};
    use chrono::Utc;
    use mockall::Sequence;
    use std::sync::{Arc, Mutex};

    fn ok() -> crate::error::Result<ApprovalResponse> {
        Ok(ApprovalResponse {
            success: true,
            message: None,
        })
    }

    fn approve_5000() -> ResolvedApproval {
        ApprovalForm::approve(Money::new(5000.0, Currency::KES))
            .resolve(&staff_identity(), Utc::now())
            .unwrap()
    }

    fn ids(raw: &[&str]) -> Vec<ApplicationId> {
        raw.iter().map(|id| ApplicationId::new(*id)).collect()
    }

    fn with_status(mut apps: Vec<Application>, status: ApplicationStatus) -> Vec<Application> {
        for app in &mut apps {
            app.application_status = status;
        }
        apps
    }

    #[tokio::test]
    async fn test_successful_batch_updates_every_item_and_clears_selection() {
        let snapshot = vec![
            application("A1", ApplicationStatus::Pending),
            application("A2", ApplicationStatus::Pending),
        ];
        let refreshed = with_status(snapshot.clone(), ApplicationStatus::Approved);

        let mut api = MockBursaryApi::new();
        api.expect_submit_approval().times(2).returning(|_| ok());
        api.expect_list_applications()
            .times(1)
            .return_once(move |_| Ok(refreshed));

        let mut selection = Selection::new();
        selection.select_all_pending(&snapshot);

        let processor = BatchApprovalProcessor::new(&api, ExecutionPolicy::Sequential);
        let outcome = processor
            .run(&approve_5000(), selection.ids(), &snapshot, &ListScope::All)
            .await;

        assert_eq!(outcome.successful(), 2);
        assert!(outcome.is_complete_success());
        for app in outcome.refreshed().unwrap() {
            assert_eq!(app.application_status, ApplicationStatus::Approved);
        }

        assert!(outcome.settle(&mut selection));
        assert!(selection.is_empty());
    }

    #[tokio::test]
    async fn test_stale_selection_is_not_sent() {
        // A1 pending, A2 approved by someone else after it was picked
        let snapshot = vec![
            application("A1", ApplicationStatus::Pending),
            application("A2", ApplicationStatus::Approved),
        ];
        let mut refreshed = snapshot.clone();
        refreshed[0].application_status = ApplicationStatus::Approved;

        let sent = Arc::new(Mutex::new(Vec::new()));
        let sent_clone = Arc::clone(&sent);

        let mut api = MockBursaryApi::new();
        api.expect_submit_approval().times(1).returning(move |request| {
            sent_clone
                .lock()
                .unwrap()
                .push(request.bursary_application_id.clone());
            ok()
        });
        api.expect_list_applications()
            .times(1)
            .return_once(move |_| Ok(refreshed));

        let processor = BatchApprovalProcessor::new(&api, ExecutionPolicy::Sequential);
        let outcome = processor
            .run(&approve_5000(), &ids(&["A1", "A2"]), &snapshot, &ListScope::All)
            .await;

        assert_eq!(*sent.lock().unwrap(), ids(&["A1"]));
        assert_eq!(outcome.successful(), 1);
        assert_eq!(
            outcome.results[1].outcome,
            ItemOutcome::Error {
                kind: ItemErrorKind::AlreadyProcessed,
                detail: ALREADY_PROCESSED.to_string()
            }
        );

        let a1 = &outcome.refreshed().unwrap()[0];
        assert_eq!(a1.application_status, ApplicationStatus::Approved);
    }

    #[tokio::test]
    async fn test_missing_id_reports_not_found() {
        let snapshot = vec![application("A1", ApplicationStatus::Pending)];

        let mut api = MockBursaryApi::new();
        api.expect_submit_approval().never();
        api.expect_list_applications()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let processor = BatchApprovalProcessor::new(&api, ExecutionPolicy::Sequential);
        let outcome = processor
            .run(&approve_5000(), &ids(&["ZZ"]), &snapshot, &ListScope::All)
            .await;

        assert_eq!(
            outcome.results[0].outcome,
            ItemOutcome::Error {
                kind: ItemErrorKind::NotFound,
                detail: NOT_FOUND.to_string()
            }
        );
        assert_eq!(outcome.errors(), vec!["ZZ: not found".to_string()]);
    }

    #[tokio::test]
    async fn test_partial_failure_continues_and_refreshes_once() {
        let snapshot = vec![
            application("A1", ApplicationStatus::Pending),
            application("A2", ApplicationStatus::Pending),
            application("A3", ApplicationStatus::Pending),
        ];

        let mut seq = Sequence::new();
        let mut api = MockBursaryApi::new();
        api.expect_submit_approval()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| ok());
        api.expect_submit_approval()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BursaryError::api(500, "database timeout")));
        api.expect_submit_approval()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| ok());
        api.expect_list_applications()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let mut selection = Selection::new();
        selection.select_all_pending(&snapshot);

        let processor = BatchApprovalProcessor::new(&api, ExecutionPolicy::Sequential);
        let outcome = processor
            .run(&approve_5000(), selection.ids(), &snapshot, &ListScope::All)
            .await;

        assert_eq!(outcome.successful(), 2);
        assert_eq!(outcome.failed(), 1);
        assert_eq!(outcome.errors(), vec!["A2: database timeout".to_string()]);
        assert!(outcome.summary_message().starts_with("2 succeeded, 1 failed"));

        assert!(!outcome.settle(&mut selection));
        assert_eq!(selection.len(), 3);
    }

    #[tokio::test]
    async fn test_uniqueness_violation_is_normalized() {
        let snapshot = vec![
            application("A1", ApplicationStatus::Pending),
            application("A2", ApplicationStatus::Pending),
        ];

        let mut seq = Sequence::new();
        let mut api = MockBursaryApi::new();
        api.expect_submit_approval()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(BursaryError::api(
                    409,
                    "Uniqueness constraint violation on BursaryApprovals",
                ))
            });
        api.expect_submit_approval()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(ApprovalResponse {
                    success: false,
                    message: Some("Allocation exceeds fund balance".to_string()),
                })
            });
        api.expect_list_applications()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let processor = BatchApprovalProcessor::new(&api, ExecutionPolicy::Sequential);
        let outcome = processor
            .run(&approve_5000(), &ids(&["A1", "A2"]), &snapshot, &ListScope::All)
            .await;

        assert_eq!(
            outcome.results[0].outcome,
            ItemOutcome::Error {
                kind: ItemErrorKind::AlreadyProcessed,
                detail: ALREADY_PROCESSED.to_string()
            }
        );
        assert_eq!(
            outcome.results[1].outcome,
            ItemOutcome::Error {
                kind: ItemErrorKind::Rejected,
                detail: "Allocation exceeds fund balance".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_item_results() {
        let snapshot = vec![application("A1", ApplicationStatus::Pending)];

        let mut api = MockBursaryApi::new();
        api.expect_submit_approval().times(1).returning(|_| ok());
        api.expect_list_applications()
            .times(1)
            .returning(|_| Err(BursaryError::api(503, "Service Unavailable")));

        let processor = BatchApprovalProcessor::new(&api, ExecutionPolicy::Sequential);
        let outcome = processor
            .run(&approve_5000(), &ids(&["A1"]), &snapshot, &ListScope::All)
            .await;

        assert!(outcome.is_complete_success());
        assert!(outcome.refreshed().is_none());
        assert!(outcome
            .refresh_error()
            .unwrap()
            .starts_with("processed but refresh failed"));
    }

    #[tokio::test]
    async fn test_every_item_shares_synthesized_label() {
        let snapshot = vec![
            application("A1", ApplicationStatus::Pending),
            application("A2", ApplicationStatus::Pending),
            application("A3", ApplicationStatus::Pending),
        ];

        let labels = Arc::new(Mutex::new(Vec::new()));
        let labels_clone = Arc::clone(&labels);

        let mut api = MockBursaryApi::new();
        api.expect_submit_approval().times(3).returning(move |request| {
            labels_clone
                .lock()
                .unwrap()
                .push(request.assigned_batch_number.clone());
            ok()
        });
        api.expect_list_applications()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let approval = approve_5000();
        let processor = BatchApprovalProcessor::new(&api, ExecutionPolicy::Sequential);
        processor
            .run(&approval, &ids(&["A1", "A2", "A3"]), &snapshot, &ListScope::All)
            .await;

        let labels = labels.lock().unwrap();
        assert_eq!(labels.len(), 3);
        assert!(labels.iter().all(|label| label == &approval.batch_label));
        assert!(labels[0].starts_with("BATCH-"));
    }

    #[tokio::test]
    async fn test_rejection_request_carries_forced_values() {
        let snapshot = vec![application("A1", ApplicationStatus::Pending)];

        let mut api = MockBursaryApi::new();
        api.expect_submit_approval()
            .withf(|request| {
                request.approval_status == ApplicationStatus::Rejected
                    && request.amount_allocated == Money::zero_kes()
                    && request.assigned_batch_number == "Not assigned"
                    && request.amount_applied_for == Money::new(10000.0, Currency::KES)
            })
            .times(1)
            .returning(|_| ok());
        api.expect_list_applications()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let approval = ApprovalForm::reject()
            .resolve(&staff_identity(), Utc::now())
            .unwrap();
        let processor = BatchApprovalProcessor::new(&api, ExecutionPolicy::Sequential);
        let outcome = processor
            .run(&approval, &ids(&["A1"]), &snapshot, &ListScope::All)
            .await;

        assert!(outcome.is_complete_success());
    }

    #[tokio::test]
    async fn test_bounded_parallel_reports_in_selection_order() {
        let snapshot = vec![
            application("A1", ApplicationStatus::Pending),
            application("A2", ApplicationStatus::Approved),
            application("A3", ApplicationStatus::Pending),
        ];

        let mut api = MockBursaryApi::new();
        api.expect_submit_approval().times(2).returning(|_| ok());
        api.expect_list_applications()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let processor = BatchApprovalProcessor::new(
            &api,
            ExecutionPolicy::BoundedParallel { max_in_flight: 2 },
        )
        .with_observer(move |result| seen_clone.lock().unwrap().push(result.id.clone()));

        let outcome = processor
            .run(&approve_5000(), &ids(&["A1", "A2", "A3"]), &snapshot, &ListScope::All)
            .await;

        let order: Vec<_> = outcome.results.iter().map(|r| r.id.clone()).collect();
        assert_eq!(order, ids(&["A1", "A2", "A3"]));
        assert_eq!(*seen.lock().unwrap(), ids(&["A1", "A2", "A3"]));
        assert_eq!(outcome.successful(), 2);
    }

    #[tokio::test]
    async fn test_bounded_parallel_runs_on_spawned_task() {
        let snapshot = vec![
            application("A1", ApplicationStatus::Pending),
            application("A2", ApplicationStatus::Pending),
        ];

        let mut api = MockBursaryApi::new();
        api.expect_submit_approval().times(2).returning(|_| ok());
        api.expect_list_applications()
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let api: Arc<dyn crate::api::BursaryApi> = Arc::new(api);

        let approval = approve_5000();
        let selected = ids(&["A1", "A2"]);
        let handle = tokio::spawn(async move {
            let processor = BatchApprovalProcessor::new(
                api.as_ref(),
                ExecutionPolicy::BoundedParallel { max_in_flight: 2 },
            );
            processor
                .run(&approval, &selected, &snapshot, &ListScope::All)
                .await
        });

        let outcome = handle.await.unwrap();
        assert!(outcome.is_complete_success());
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_raw_message() {
        let snapshot = vec![application("A1", ApplicationStatus::Pending)];

        let mut api = MockBursaryApi::new();
        api.expect_submit_approval()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("connection reset by peer").into()));
        api.expect_list_applications()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let processor = BatchApprovalProcessor::new(&api, ExecutionPolicy::Sequential);
        let outcome = processor
            .run(&approve_5000(), &ids(&["A1"]), &snapshot, &ListScope::All)
            .await;

        assert_eq!(
            outcome.results[0].outcome,
            ItemOutcome::Error {
                kind: ItemErrorKind::Transport,
                detail: "connection reset by peer".to_string()
            }
        );
        assert_eq!(outcome.failed(), 1);
    }
}
