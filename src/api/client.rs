use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    api::{
        types::{
            ApplicationUpdate, ApprovalRequest, ApprovalResponse, LoginRequest, LoginResponse,
            PayoutRequest, PayoutResponse,
        },
        BursaryApi,
    },
    config::ApiConfig,
    error::{BursaryError, Result},
    models::{Application, ApplicationId, ApprovalRecord, DisbursementRecord, ListScope},
};

/// reqwest-backed client for the bursary, payout and auth services
#[derive(Clone)]
pub struct HttpBursaryClient {
    client: Client,
    base_url: String,
    payout_base_url: String,
    auth_base_url: String,
}

impl std::fmt::Debug for HttpBursaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBursaryClient")
            .field("base_url", &self.base_url)
            .field("payout_base_url", &self.payout_base_url)
            .field("auth_base_url", &self.auth_base_url)
            .finish()
    }
}

impl HttpBursaryClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: trim_base(&config.base_url),
            payout_base_url: trim_base(&config.payout_base_url),
            auth_base_url: trim_base(&config.auth_base_url),
        })
    }

    fn bursary_url(&self, path: &str) -> String {
        format!("{}/api/Bursary/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Decode a success body, or turn the response into `BursaryError::Api`
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    warn!("API responded {}: {}", status, message);
    Err(BursaryError::api(status.as_u16(), message))
}

/// Pull a human-readable message out of an error body (JSON or plain text)
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["message", "Message", "title", "error", "detail"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return Some(text.to_string());
            }
        }
        if let Some(text) = value.as_str() {
            return Some(text.to_string());
        }
    }

    Some(trimmed.to_string())
}

#[async_trait]
impl BursaryApi for HttpBursaryClient {
    async fn list_applications(&self, scope: &ListScope) -> Result<Vec<Application>> {
        let url = match scope {
            ListScope::All => self.bursary_url("all"),
            ListScope::ByPhone(phone) => {
                self.bursary_url(&format!("get-bursary-applications-by-phone/{}", phone))
            }
        };
        self.get_json(url).await
    }

    async fn get_application(&self, id: &ApplicationId) -> Result<Application> {
        self.get_json(self.bursary_url(&format!("get/{}", id))).await
    }

    async fn get_approval(&self, id: &ApplicationId) -> Result<ApprovalRecord> {
        self.get_json(self.bursary_url(&format!("approval/bursary-application-id/{}", id)))
            .await
    }

    async fn submit_approval(&self, request: &ApprovalRequest) -> Result<ApprovalResponse> {
        let url = self.bursary_url("approve-reject-bursary-application");
        debug!("PUT {} for application {}", url, request.bursary_application_id);

        let response = self.client.put(&url).json(request).send().await?;
        decode(response).await
    }

    async fn update_application(
        &self,
        id: &ApplicationId,
        update: &ApplicationUpdate,
        token: &str,
    ) -> Result<()> {
        let url = self.bursary_url(&format!("update/{}", id));
        debug!("PUT {}", url);

        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(update)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(BursaryError::api(
            status.as_u16(),
            extract_message(&body).unwrap_or_else(|| "Update failed".to_string()),
        ))
    }

    async fn list_disbursements(&self) -> Result<Vec<DisbursementRecord>> {
        self.get_json(format!("{}/api/disbursement", self.base_url)).await
    }

    async fn send_payout(&self, request: &PayoutRequest) -> Result<PayoutResponse> {
        let url = format!("{}/api/PayPalPayout/send", self.payout_base_url);
        debug!("POST {} with {} items", url, request.items.len());

        let response = self.client.post(&url).json(request).send().await?;
        decode(response).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let url = format!("{}/api/v1/auth/login", self.auth_base_url);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<LoginResponse>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body)
            .unwrap_or_else(|| "Invalid credentials. Please try again.".to_string());
        Err(BursaryError::Unauthorized(message))
    }
}
