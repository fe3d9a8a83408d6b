use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    api::{ApplicationUpdate, BursaryApi},
    approval::{
        batch::{BatchApprovalProcessor, BatchOutcome, ExecutionPolicy},
        form::{ApprovalForm, UNASSIGNED_BATCH},
    },
    error::{BursaryError, Result},
    models::{Application, ApplicationId, ApplicationStatus, Identity, ListScope, Money},
};

/// Application record merged with its approval record
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationDetails {
    pub application: Application,
    pub status: ApplicationStatus,
    pub batch_label: String,
    pub allocation: Money,
    pub remark: String,
    pub approver: Option<String>,
    pub approved_date: Option<DateTime<Utc>>,
}

impl ApplicationDetails {
    /// Prefills the approval form with the current decision
    pub fn approval_form(&self) -> ApprovalForm {
        match self.status {
            ApplicationStatus::Rejected => ApprovalForm::reject().with_remark(self.remark.clone()),
            _ => ApprovalForm::approve(self.allocation)
                .with_batch_label(self.batch_label.clone())
                .with_remark(self.remark.clone()),
        }
    }

    /// Set one profile or academic field by name (snake_case or camelCase)
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        let app = &mut self.application;
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        let slot = match normalized.as_str() {
            "applicantfullname" | "fullname" | "name" => &mut app.applicant_full_name,
            "applicantphonenumber" | "phone" => &mut app.applicant_phone_number,
            "applicantemail" | "emailaddress" | "email" => &mut app.applicant_email,
            "admissionnumber" => &mut app.admission_number,
            "nationalidentificationnumber" | "nationalid" => {
                &mut app.national_identification_number
            }
            "schoolname" | "school" => &mut app.school_name,
            "departmentname" | "department" => &mut app.department_name,
            "enrolledcourse" | "course" => &mut app.enrolled_course,
            "yearofstudy" | "year" => &mut app.year_of_study,
            "previousacademicyeargrade" | "grade" => &mut app.previous_academic_year_grade,
            "sponsorshiptype" => &mut app.sponsorship_type,
            "anyformofdisability" | "disability" => &mut app.any_form_of_disability,
            "county" => &mut app.county,
            _ => {
                return Err(BursaryError::InvalidInput(format!(
                    "'{}' is not an editable field",
                    name
                )))
            }
        };

        *slot = value.trim().to_string();
        Ok(())
    }

    /// Profile and academic fields as the update endpoint expects them
    pub fn update_payload(&self) -> ApplicationUpdate {
        let app = &self.application;
        ApplicationUpdate {
            application_id: app.id.to_string(),
            applicant_full_name: app.applicant_full_name.clone(),
            applicant_phone_number: app.applicant_phone_number.clone(),
            email_address: app.applicant_email.clone(),
            admission_number: app.admission_number.clone(),
            national_identification_number: app.national_identification_number.clone(),
            school_name: app.school_name.clone(),
            department_name: app.department_name.clone(),
            enrolled_course: app.enrolled_course.clone(),
            year_of_study: app.year_of_study.clone(),
            previous_academic_year_grade: app.previous_academic_year_grade.clone(),
            sponsorship_type: app.sponsorship_type.clone(),
            any_form_of_disability: app.any_form_of_disability.clone(),
            application_status: self.status.as_str().to_string(),
            county: app.county.clone(),
            batch_number: if self.batch_label == UNASSIGNED_BATCH {
                String::new()
            } else {
                self.batch_label.clone()
            },
        }
    }
}

/// Fetch both records for `id` concurrently. Both are required, except that
/// a Pending application may have no approval record yet.
pub async fn load_details<A: BursaryApi + ?Sized>(
    api: &A,
    id: &ApplicationId,
) -> Result<ApplicationDetails> {
    let (application, approval) = futures::join!(api.get_application(id), api.get_approval(id));

    let application = application.map_err(|e| {
        warn!("Loading application {} failed: {}", id, e);
        if e.is_not_found() {
            BursaryError::NotFound(id.to_string())
        } else {
            BursaryError::DetailsUnavailable(e.to_string())
        }
    })?;

    let approval = match approval {
        Ok(record) => Some(record),
        Err(e) if e.is_not_found() && application.is_pending() => None,
        Err(e) => {
            warn!("Loading approval record for {} failed: {}", id, e);
            return Err(BursaryError::DetailsUnavailable(e.to_string()));
        }
    };

    let details = match approval {
        Some(record) => ApplicationDetails {
            status: record.approval_status.unwrap_or(ApplicationStatus::Pending),
            batch_label: record.assigned_batch_number.unwrap_or_default(),
            allocation: record.amount_allocated.unwrap_or_else(Money::zero_kes),
            remark: record.remark.unwrap_or_default(),
            approver: Some(record.approver_full_name).filter(|name| !name.is_empty()),
            approved_date: record.approved_date,
            application,
        },
        None => ApplicationDetails {
            status: ApplicationStatus::Pending,
            batch_label: String::new(),
            allocation: Money::zero_kes(),
            remark: String::new(),
            approver: None,
            approved_date: None,
            application,
        },
    };

    Ok(details)
}

/// Resubmit edited profile fields, then reload. Only staff or the owning
/// applicant may do this.
pub async fn submit_profile_edit<A: BursaryApi + ?Sized>(
    api: &A,
    identity: &Identity,
    details: &ApplicationDetails,
) -> Result<ApplicationDetails> {
    let owner = details.application.applicant_phone_number == identity.phone;
    if !identity.is_staff() && !owner {
        return Err(BursaryError::Unauthorized(
            "only the applicant can edit this application".to_string(),
        ));
    }

    let token = identity.bearer_token()?;
    let id = &details.application.id;

    api.update_application(id, &details.update_payload(), token).await?;
    info!("Application {} updated by {}", id, identity.display_name);

    load_details(api, id).await
}

/// Result of a staff decision made from the details view
#[derive(Debug)]
pub struct DecisionOutcome {
    pub batch: BatchOutcome,
    /// Fresh details, or the reason they could not be reloaded. A failed
    /// reload leaves the item results in `batch` untouched.
    pub reloaded: std::result::Result<ApplicationDetails, String>,
}

/// Staff decision from the details view: a batch of one through the normal
/// approval path, followed by a reload of the details.
pub async fn submit_decision<A: BursaryApi + ?Sized>(
    api: &A,
    policy: ExecutionPolicy,
    identity: &Identity,
    details: &ApplicationDetails,
    form: &ApprovalForm,
) -> Result<DecisionOutcome> {
    let approval = form.resolve(identity, Utc::now())?;

    let mut snapshot = details.application.clone();
    snapshot.application_status = details.status;
    let id = snapshot.id.clone();

    let batch = BatchApprovalProcessor::new(api, policy)
        .run(&approval, &[id.clone()], &[snapshot], &ListScope::All)
        .await;

    let reloaded = load_details(api, &id).await.map_err(|e| {
        warn!("Reloading {} after decision failed: {}", id, e);
        format!("processed but refresh failed: {}", e)
    });

    Ok(DecisionOutcome { batch, reloaded })
}
