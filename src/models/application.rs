use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Remote identifiers come back as either JSON numbers or strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApplicationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for ApplicationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => ApplicationId(s),
            Raw::Int(n) => ApplicationId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum Currency {
    KES,
    USD,
}

impl Default for Currency {
    fn default() -> Self {
        Currency::KES
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::KES => write!(f, "KES"),
            Currency::USD => write!(f, "USD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KES" => Ok(Currency::KES),
            "USD" => Ok(Currency::USD),
            other => Err(format!("unsupported currency '{}' (expected KES or USD)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Money {
    pub amount: f64,
    #[serde(default)]
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero_kes() -> Self {
        Self::new(0.0, Currency::KES)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, crate::utils::format_amount(self.amount))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn is_pending(&self) -> bool {
        *self == ApplicationStatus::Pending
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl Default for ApplicationStatus {
    fn default() -> Self {
        ApplicationStatus::Pending
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "bursaryApplicationId")]
    pub id: ApplicationId,
    #[serde(default)]
    pub applicant_full_name: String,
    #[serde(default)]
    pub applicant_phone_number: String,
    #[serde(default, alias = "emailAddress")]
    pub applicant_email: String,
    #[serde(default)]
    pub national_identification_number: String,
    #[serde(default)]
    pub admission_number: String,
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub department_name: String,
    #[serde(default)]
    pub enrolled_course: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year_of_study: String,
    #[serde(default)]
    pub previous_academic_year_grade: String,
    #[serde(default)]
    pub sponsorship_type: String,
    #[serde(default)]
    pub any_form_of_disability: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub amount_applied_for: Money,
    #[serde(default)]
    pub application_status: ApplicationStatus,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub application_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
}

impl Application {
    pub fn is_pending(&self) -> bool {
        self.application_status.is_pending()
    }

    /// Batch label, ignoring blanks the API sometimes sends for unprocessed rows
    pub fn batch_label(&self) -> Option<&str> {
        self.batch_number
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}

/// Approval record, one per processed application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bursary_application_id: Option<ApplicationId>,
    #[serde(default)]
    pub approver_full_name: String,
    #[serde(default)]
    pub approval_status: Option<ApplicationStatus>,
    #[serde(default)]
    pub assigned_batch_number: Option<String>,
    #[serde(default)]
    pub amount_applied_for: Option<Money>,
    #[serde(default)]
    pub amount_allocated: Option<Money>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub approved_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisbursementRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub student: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub amount: f64,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}

/// Accepts RFC 3339 as well as the offset-less timestamps some backends emit
fn flexible_datetime<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, format) {
            return Ok(Some(naive.and_utc()));
        }
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()));
    }

    Err(serde::de::Error::custom(format!("unrecognised timestamp '{}'", raw)))
}
