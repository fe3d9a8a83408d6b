//! Approve/reject workflow: the operator's form, the row selection, the batch
//! processor that turns both into per-item requests, and the details view.

pub mod batch;
pub mod details;
pub mod form;
pub mod selection;

pub use batch::{
    BatchApprovalProcessor, BatchOutcome, ExecutionPolicy, ItemErrorKind, ItemOutcome, ItemResult,
    RefreshOutcome,
};
pub use details::{
    load_details, submit_decision, submit_profile_edit, ApplicationDetails, DecisionOutcome,
};
pub use form::{synthesize_batch_label, ApprovalForm, Disposition, ResolvedApproval, UNASSIGNED_BATCH};
pub use selection::Selection;
