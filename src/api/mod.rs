pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{Application, ApplicationId, ApprovalRecord, DisbursementRecord, ListScope},
};

pub use client::HttpBursaryClient;
pub use types::{
    ApplicationUpdate, ApprovalRequest, ApprovalResponse, LoginRequest, LoginResponse,
    PayoutAmount, PayoutItem, PayoutRequest, PayoutResponse, SenderBatchHeader,
};

/// Remote endpoints the client consumes.
///
/// Non-success statuses surface as `BursaryError::Api`, transport failures as
/// `BursaryError::Http`. `submit_approval` returns the body even when its
/// `success` flag is false; interpreting that flag is the caller's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BursaryApi: Send + Sync {
    async fn list_applications(&self, scope: &ListScope) -> Result<Vec<Application>>;

    async fn get_application(&self, id: &ApplicationId) -> Result<Application>;

    async fn get_approval(&self, id: &ApplicationId) -> Result<ApprovalRecord>;

    async fn submit_approval(&self, request: &ApprovalRequest) -> Result<ApprovalResponse>;

    async fn update_application(
        &self,
        id: &ApplicationId,
        update: &ApplicationUpdate,
        token: &str,
    ) -> Result<()>;

    async fn list_disbursements(&self) -> Result<Vec<DisbursementRecord>>;

    async fn send_payout(&self, request: &PayoutRequest) -> Result<PayoutResponse>;

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{Application, ApplicationId, ApplicationStatus, Currency, Money};

    pub fn application(id: &str, status: ApplicationStatus) -> Application {
        Application {
            id: ApplicationId::new(id),
            applicant_full_name: format!("Applicant {}", id),
            applicant_phone_number: "0712345678".to_string(),
            applicant_email: format!("{}@student.example", id.to_lowercase()),
            national_identification_number: "12345678".to_string(),
            admission_number: format!("ADM-{}", id),
            school_name: "School of ICT".to_string(),
            department_name: "Computer Science".to_string(),
            enrolled_course: "BSc Computer Science".to_string(),
            year_of_study: "2".to_string(),
            previous_academic_year_grade: "B".to_string(),
            sponsorship_type: "Self".to_string(),
            any_form_of_disability: "None".to_string(),
            county: "Nairobi".to_string(),
            amount_applied_for: Money::new(10000.0, Currency::KES),
            application_status: status,
            application_date: None,
            batch_number: None,
        }
    }
}
