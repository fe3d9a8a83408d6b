use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ApplicationId, ApplicationStatus, Currency, Identity, Money, Role};

/// Body of `PUT /api/Bursary/approve-reject-bursary-application`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub approver_full_name: String,
    pub approver_phone_number: String,
    pub approver_email: String,
    pub approver_national_identification_number: String,
    pub bursary_application_id: ApplicationId,
    pub approval_status: ApplicationStatus,
    pub assigned_batch_number: String,
    pub amount_applied_for: Money,
    pub amount_allocated: Money,
    pub remark: String,
    pub approved_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApprovalResponse {
    #[serde(alias = "isSuccess", alias = "Success")]
    pub success: bool,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
}

/// Body of `PUT /api/Bursary/update/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationUpdate {
    pub application_id: String,
    pub applicant_full_name: String,
    pub applicant_phone_number: String,
    pub email_address: String,
    pub admission_number: String,
    pub national_identification_number: String,
    pub school_name: String,
    pub department_name: String,
    pub enrolled_course: String,
    pub year_of_study: String,
    pub previous_academic_year_grade: String,
    pub sponsorship_type: String,
    pub any_form_of_disability: String,
    pub application_status: String,
    pub county: String,
    pub batch_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutRequest {
    pub sender_batch_header: SenderBatchHeader,
    pub items: Vec<PayoutItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderBatchHeader {
    pub sender_batch_id: String,
    pub email_subject: String,
    pub email_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutItem {
    pub recipient_type: String,
    pub amount: PayoutAmount,
    pub note: String,
    pub sender_item_id: String,
    pub receiver: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutAmount {
    /// Decimal string with two places, as the gateway expects
    pub value: String,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PayoutResponse {
    pub batch_header: PayoutBatchHeader,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PayoutBatchHeader {
    pub payout_batch_id: String,
    #[serde(default)]
    pub batch_status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub national_identification_number: String,
    #[serde(default, alias = "accessToken", alias = "jwt")]
    pub token: Option<String>,
}

impl From<LoginResponse> for Identity {
    fn from(value: LoginResponse) -> Self {
        Identity {
            display_name: value.username,
            phone: value.phone_number,
            role: Role::from(value.role),
            email: value.email_address,
            national_id: value.national_identification_number,
            token: value.token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_request_wire_names() {
        let request = ApprovalRequest {
            approver_full_name: "Grace".to_string(),
            approver_phone_number: "0700".to_string(),
            approver_email: "g@example.com".to_string(),
            approver_national_identification_number: "1".to_string(),
            bursary_application_id: ApplicationId::new("7"),
            approval_status: ApplicationStatus::Approved,
            assigned_batch_number: "BATCH-1".to_string(),
            amount_applied_for: Money::new(10000.0, Currency::KES),
            amount_allocated: Money::new(5000.0, Currency::KES),
            remark: "ok".to_string(),
            approved_date: Utc::now(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["bursaryApplicationId"], "7");
        assert_eq!(value["approvalStatus"], "Approved");
        assert_eq!(value["assignedBatchNumber"], "BATCH-1");
        assert_eq!(value["amountAllocated"]["currency"], "KES");
    }

    #[test]
    fn test_login_response_to_identity() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"username":"Grace","phoneNumber":"0700","role":"ROLE_ADMIN",
                "emailAddress":"g@example.com","nationalIdentificationNumber":"1","accessToken":"t"}"#,
        )
        .unwrap();

        let identity = Identity::from(response);
        assert!(identity.is_staff());
        assert_eq!(identity.token.as_deref(), Some("t"));
    }
}
