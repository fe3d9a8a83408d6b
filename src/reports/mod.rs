pub mod export;

use std::{fmt, str::FromStr};
use tracing::info;

use crate::{
    api::BursaryApi,
    error::{BursaryError, Result},
    models::{Application, DisbursementRecord, Identity},
    utils::format_money,
};

pub use export::{export, ExportFormat};

/// Disbursement statuses the report can be narrowed to
pub const DISBURSEMENT_STATUSES: [&str; 3] = ["Disbursed", "Withheld", "In Progress"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportKind {
    #[default]
    Applications,
    Disbursements,
}

impl ReportKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Applications => "Bursary Applications",
            ReportKind::Disbursements => "Disbursement",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ReportKind::Applications => ReportKind::Disbursements,
            ReportKind::Disbursements => ReportKind::Applications,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for ReportKind {
    type Err = BursaryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "applications" | "bursary-applications" => Ok(ReportKind::Applications),
            "disbursements" | "disbursement" => Ok(ReportKind::Disbursements),
            other => Err(BursaryError::InvalidInput(format!(
                "unknown report '{}' (expected applications or disbursements)",
                other
            ))),
        }
    }
}

/// Rendered rows ready for any export format
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub kind: ReportKind,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn applications(applications: &[Application]) -> Self {
        let rows = applications
            .iter()
            .map(|app| {
                vec![
                    app.applicant_full_name.clone(),
                    app.admission_number.clone(),
                    app.school_name.clone(),
                    app.department_name.clone(),
                    app.enrolled_course.clone(),
                    app.year_of_study.clone(),
                    app.application_status.to_string(),
                    app.application_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                    format_money(Some(&app.amount_applied_for)),
                ]
            })
            .collect();

        Self {
            kind: ReportKind::Applications,
            columns: vec![
                "Full Name",
                "Admission No",
                "School",
                "Department",
                "Course",
                "Year",
                "Status",
                "Application Date",
                "Amount Applied",
            ],
            rows,
        }
    }

    /// `status` narrows to one disbursement status; `None` keeps all
    pub fn disbursements(records: &[DisbursementRecord], status: Option<&str>) -> Self {
        let rows = records
            .iter()
            .filter(|r| status.map_or(true, |s| r.status.eq_ignore_ascii_case(s)))
            .map(|r| {
                vec![
                    r.id.clone(),
                    r.student.clone(),
                    r.status.clone(),
                    format!("${}", crate::utils::format_amount(r.amount)),
                ]
            })
            .collect();

        Self {
            kind: ReportKind::Disbursements,
            columns: vec!["ID", "Student", "Status", "Amount"],
            rows,
        }
    }

    pub fn title(&self) -> String {
        format!("{} Report", self.kind.title())
    }

    /// Exports are offered only when there is something to write
    pub fn can_export(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fetch the dataset for `kind`. Applications are scoped to the identity.
pub async fn load_report<A: BursaryApi + ?Sized>(
    api: &A,
    identity: &Identity,
    kind: ReportKind,
    disbursement_status: Option<&str>,
) -> Result<ReportTable> {
    let table = match kind {
        ReportKind::Applications => {
            let scope = identity.list_scope()?;
            ReportTable::applications(&api.list_applications(&scope).await?)
        }
        ReportKind::Disbursements => {
            ReportTable::disbursements(&api.list_disbursements().await?, disbursement_status)
        }
    };

    info!("Loaded {} with {} row(s)", table.title(), table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{fixtures::application, MockBursaryApi};
    use crate::models::{session::applicant_identity, ApplicationStatus, ListScope};

    fn disbursement(id: &str, status: &str, amount: f64) -> DisbursementRecord {
        DisbursementRecord {
            id: id.to_string(),
            student: format!("Student {}", id),
            status: status.to_string(),
            amount,
        }
    }

    #[test]
    fn test_application_rows_render_money() {
        let table = ReportTable::applications(&[application("A1", ApplicationStatus::Approved)]);
        assert_eq!(table.rows[0][8], "KES 10,000");
        assert_eq!(table.rows[0][7], "N/A");
        assert_eq!(table.title(), "Bursary Applications Report");
        assert!(table.can_export());
    }

    #[test]
    fn test_disbursement_status_filter() {
        let records = vec![
            disbursement("1", "Disbursed", 500.0),
            disbursement("2", "Withheld", 250.0),
            disbursement("3", "disbursed", 1200.0),
        ];

        let all = ReportTable::disbursements(&records, None);
        assert_eq!(all.len(), 3);

        let disbursed = ReportTable::disbursements(&records, Some("Disbursed"));
        assert_eq!(disbursed.len(), 2);
        assert_eq!(disbursed.rows[1][3], "$1,200");

        let none = ReportTable::disbursements(&records, Some("In Progress"));
        assert!(!none.can_export());
    }

    #[tokio::test]
    async fn test_applications_report_is_role_scoped() {
        let mut api = MockBursaryApi::new();
        api.expect_list_applications()
            .withf(|scope| *scope == ListScope::ByPhone("0712345678".to_string()))
            .times(1)
            .returning(|_| Ok(vec![application("A1", ApplicationStatus::Pending)]));

        let table = load_report(&api, &applicant_identity(), ReportKind::Applications, None)
            .await
            .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_report_kind() {
        assert_eq!("Applications".parse::<ReportKind>().unwrap(), ReportKind::Applications);
        assert_eq!("disbursements".parse::<ReportKind>().unwrap(), ReportKind::Disbursements);
        assert!("vouchers".parse::<ReportKind>().is_err());
    }
}
