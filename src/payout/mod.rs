//! Payout of one approved batch through the gateway.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    api::{BursaryApi, PayoutAmount, PayoutItem, PayoutRequest, PayoutResponse, SenderBatchHeader},
    config::PayoutConfig,
    error::{BursaryError, Result},
    models::{Application, ApplicationStatus, Identity, ListScope},
};

const RECIPIENT_TYPE: &str = "EMAIL";

/// Approved applications carrying `label`
pub fn payable<'a>(applications: &'a [Application], label: &str) -> Vec<&'a Application> {
    let label = label.trim();
    applications
        .iter()
        .filter(|app| app.batch_label() == Some(label))
        .filter(|app| app.application_status == ApplicationStatus::Approved)
        .collect()
}

/// Gateway amount: applied amount over the divisor, two decimals
pub fn payout_value(application: &Application, config: &PayoutConfig) -> String {
    format!(
        "{:.2}",
        application.amount_applied_for.amount / config.minor_unit_divisor
    )
}

pub fn build_request(
    label: &str,
    applications: &[&Application],
    config: &PayoutConfig,
    now: DateTime<Utc>,
) -> PayoutRequest {
    let items = applications
        .iter()
        .map(|app| PayoutItem {
            recipient_type: RECIPIENT_TYPE.to_string(),
            amount: PayoutAmount {
                value: payout_value(app, config),
                currency: config.currency,
            },
            note: format!("Bursary payment for {}", app.applicant_full_name),
            sender_item_id: format!("BURSARY_{}", app.admission_number),
            receiver: config
                .receiver_override
                .clone()
                .unwrap_or_else(|| app.applicant_email.clone()),
        })
        .collect();

    PayoutRequest {
        sender_batch_header: SenderBatchHeader {
            sender_batch_id: format!("BURSARY_{}_{}", label.trim(), now.timestamp_millis()),
            email_subject: config.email_subject.clone(),
            email_message: config.email_message.clone(),
        },
        items,
    }
}

/// Fetch the full list and build the payout for `label`. Nothing is sent.
pub async fn prepare<A: BursaryApi + ?Sized>(
    api: &A,
    identity: &Identity,
    label: &str,
    config: &PayoutConfig,
    now: DateTime<Utc>,
) -> Result<PayoutRequest> {
    identity.require_staff("Triggering a payout")?;

    let label = label.trim();
    if label.is_empty() {
        return Err(BursaryError::InvalidInput(
            "a batch label is required".to_string(),
        ));
    }

    let applications = api.list_applications(&ListScope::All).await?;
    let payable = payable(&applications, label);
    if payable.is_empty() {
        warn!("Batch {} has no approved applications", label);
        return Err(BursaryError::NothingToPay(label.to_string()));
    }

    info!("Prepared payout of {} item(s) for batch {}", payable.len(), label);
    Ok(build_request(label, &payable, config, now))
}

pub async fn send<A: BursaryApi + ?Sized>(
    api: &A,
    request: &PayoutRequest,
) -> Result<PayoutResponse> {
    let response = api.send_payout(request).await?;
    info!(
        "Payout {} accepted with status {}",
        response.batch_header.payout_batch_id, response.batch_header.batch_status
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{fixtures::application, types::PayoutBatchHeader, MockBursaryApi};
    use crate::models::{
        session::{applicant_identity, staff_identity},
        Currency,
    };
    use chrono::TimeZone;

    fn batch() -> Vec<Application> {
        let mut a = application("A1", ApplicationStatus::Approved);
        a.batch_number = Some("BATCH-APRIL".to_string());
        a.applicant_full_name = "Achieng Odhiambo".to_string();
        a.amount_applied_for.amount = 12345.0;

        let mut b = application("A2", ApplicationStatus::Approved);
        b.batch_number = Some("BATCH-MAY".to_string());

        let mut c = application("A3", ApplicationStatus::Rejected);
        c.batch_number = Some("BATCH-APRIL".to_string());

        vec![a, b, c]
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_744_620_433_938).unwrap()
    }

    #[test]
    fn test_only_approved_in_label_are_payable() {
        let apps = batch();
        let payable = payable(&apps, "BATCH-APRIL");
        assert_eq!(payable.len(), 1);
        assert_eq!(payable[0].id.as_str(), "A1");
    }

    #[test]
    fn test_request_shape() {
        let apps = batch();
        let config = PayoutConfig::default();
        let request = build_request("BATCH-APRIL", &payable(&apps, "BATCH-APRIL"), &config, now());

        assert_eq!(
            request.sender_batch_header.sender_batch_id,
            "BURSARY_BATCH-APRIL_1744620433938"
        );
        assert_eq!(request.sender_batch_header.email_subject, "Bursary Payment Notification");

        let item = &request.items[0];
        assert_eq!(item.recipient_type, "EMAIL");
        assert_eq!(item.amount.value, "123.45");
        assert_eq!(item.amount.currency, Currency::USD);
        assert_eq!(item.note, "Bursary payment for Achieng Odhiambo");
        assert_eq!(item.sender_item_id, "BURSARY_ADM-A1");
        assert_eq!(item.receiver, "a1@student.example");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["items"][0]["amount"]["value"], "123.45");
        assert_eq!(json["items"][0]["amount"]["currency"], "USD");
    }

    #[test]
    fn test_receiver_override() {
        let apps = batch();
        let config = PayoutConfig {
            receiver_override: Some("sandbox@payouts.example".to_string()),
            ..PayoutConfig::default()
        };
        let request = build_request("BATCH-APRIL", &payable(&apps, "BATCH-APRIL"), &config, now());
        assert_eq!(request.items[0].receiver, "sandbox@payouts.example");
    }

    #[tokio::test]
    async fn test_empty_batch_is_an_error() {
        let mut api = MockBursaryApi::new();
        api.expect_list_applications()
            .withf(|scope| *scope == ListScope::All)
            .returning(|_| Ok(batch()));
        api.expect_send_payout().never();

        let err = prepare(&api, &staff_identity(), "BATCH-JUNE", &PayoutConfig::default(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, BursaryError::NothingToPay(_)));
        assert!(err.to_string().starts_with("No approved bursaries to process"));
    }

    #[tokio::test]
    async fn test_applicant_cannot_prepare() {
        let api = MockBursaryApi::new();
        let err = prepare(&api, &applicant_identity(), "BATCH-APRIL", &PayoutConfig::default(), now())
            .await
            .unwrap_err();
        assert!(matches!(err, BursaryError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_prepare_then_send() {
        let mut api = MockBursaryApi::new();
        api.expect_list_applications().returning(|_| Ok(batch()));
        api.expect_send_payout()
            .withf(|request| request.items.len() == 1)
            .times(1)
            .returning(|_| {
                Ok(PayoutResponse {
                    batch_header: PayoutBatchHeader {
                        payout_batch_id: "PB-42".to_string(),
                        batch_status: "PENDING".to_string(),
                    },
                })
            });

        let request = prepare(&api, &staff_identity(), " BATCH-APRIL ", &PayoutConfig::default(), now())
            .await
            .unwrap();
        let response = send(&api, &request).await.unwrap();
        assert_eq!(response.batch_header.payout_batch_id, "PB-42");
    }
}
