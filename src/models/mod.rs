pub mod application;
pub mod session;

pub use application::{
    Application, ApplicationId, ApplicationStatus, ApprovalRecord, Currency, DisbursementRecord,
    Money,
};
pub use session::{Identity, ListScope, Role};
