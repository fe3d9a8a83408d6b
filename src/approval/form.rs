use chrono::{DateTime, Utc};
use std::fmt;

use crate::{
    api::ApprovalRequest,
    error::{BursaryError, Result},
    models::{Application, ApplicationStatus, Identity, Money},
};

/// Label stored on rejected applications
pub const UNASSIGNED_BATCH: &str = "Not assigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Approved,
    Rejected,
}

impl Disposition {
    pub fn status(&self) -> ApplicationStatus {
        match self {
            Disposition::Approved => ApplicationStatus::Approved,
            Disposition::Rejected => ApplicationStatus::Rejected,
        }
    }

    pub fn from_status(status: ApplicationStatus) -> Option<Self> {
        match status {
            ApplicationStatus::Approved => Some(Disposition::Approved),
            ApplicationStatus::Rejected => Some(Disposition::Rejected),
            ApplicationStatus::Pending => None,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().as_str())
    }
}

/// `BATCH-<epoch millis>`, shared by every item of one submit
pub fn synthesize_batch_label(now: DateTime<Utc>) -> String {
    format!("BATCH-{}", now.timestamp_millis())
}

/// What the operator filled in before pressing submit
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalForm {
    disposition: Disposition,
    allocation: Money,
    batch_label: String,
    remark: String,
}

impl ApprovalForm {
    pub fn approve(allocation: Money) -> Self {
        Self {
            disposition: Disposition::Approved,
            allocation,
            batch_label: String::new(),
            remark: String::new(),
        }
    }

    pub fn reject() -> Self {
        let mut form = Self::approve(Money::zero_kes());
        form.set_disposition(Disposition::Rejected);
        form
    }

    pub fn with_batch_label(mut self, label: impl Into<String>) -> Self {
        self.set_batch_label(label);
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn allocation(&self) -> Money {
        self.allocation
    }

    pub fn batch_label(&self) -> &str {
        &self.batch_label
    }

    pub fn remark(&self) -> &str {
        &self.remark
    }

    /// Switching to Rejected wipes allocation and label; switching back to
    /// Approved leaves them blank for the operator to fill.
    pub fn set_disposition(&mut self, disposition: Disposition) {
        self.disposition = disposition;
        match disposition {
            Disposition::Rejected => {
                self.allocation = Money::zero_kes();
                self.batch_label = UNASSIGNED_BATCH.to_string();
            }
            Disposition::Approved => {
                if self.batch_label == UNASSIGNED_BATCH {
                    self.batch_label.clear();
                }
            }
        }
    }

    /// Ignored while the disposition is Rejected
    pub fn set_allocation(&mut self, allocation: Money) {
        if self.disposition == Disposition::Approved {
            self.allocation = allocation;
        }
    }

    /// Ignored while the disposition is Rejected
    pub fn set_batch_label(&mut self, label: impl Into<String>) {
        if self.disposition == Disposition::Approved {
            self.batch_label = label.into();
        }
    }

    pub fn set_remark(&mut self, remark: impl Into<String>) {
        self.remark = remark.into();
    }

    /// Validate and fill in defaults. `now` is captured once per submit and
    /// becomes both the synthesized label and the request timestamp.
    pub fn resolve(&self, approver: &Identity, now: DateTime<Utc>) -> Result<ResolvedApproval> {
        approver.require_staff("Approving or rejecting applications")?;

        let (allocation, batch_label) = match self.disposition {
            Disposition::Rejected => (Money::zero_kes(), UNASSIGNED_BATCH.to_string()),
            Disposition::Approved => {
                if !self.allocation.amount.is_finite() || self.allocation.amount <= 0.0 {
                    return Err(BursaryError::InvalidInput(
                        "an allocated amount greater than zero is required to approve".to_string(),
                    ));
                }
                let label = self.batch_label.trim();
                let label = if label.is_empty() {
                    synthesize_batch_label(now)
                } else {
                    label.to_string()
                };
                (self.allocation, label)
            }
        };

        let remark = match self.remark.trim() {
            "" => format!("{} by {}", self.disposition, approver.display_name),
            text => text.to_string(),
        };

        Ok(ResolvedApproval {
            disposition: self.disposition,
            allocation,
            batch_label,
            remark,
            approver: approver.clone(),
            timestamp: now,
        })
    }
}

/// A validated form with every default applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedApproval {
    pub disposition: Disposition,
    pub allocation: Money,
    pub batch_label: String,
    pub remark: String,
    pub approver: Identity,
    pub timestamp: DateTime<Utc>,
}

impl ResolvedApproval {
    pub fn request_for(&self, application: &Application) -> ApprovalRequest {
        ApprovalRequest {
            approver_full_name: self.approver.display_name.clone(),
            approver_phone_number: self.approver.phone.clone(),
            approver_email: self.approver.email.clone(),
            approver_national_identification_number: self.approver.national_id.clone(),
            bursary_application_id: application.id.clone(),
            approval_status: self.disposition.status(),
            assigned_batch_number: self.batch_label.clone(),
            amount_applied_for: application.amount_applied_for,
            amount_allocated: self.allocation,
            remark: self.remark.clone(),
            approved_date: self.timestamp,
        }
    }
}
