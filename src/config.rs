use serde::{Deserialize, Serialize};

use crate::approval::ExecutionPolicy;
use crate::models::Currency;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub approval: ApprovalConfig,
    pub listing: ListingConfig,
    pub payout: PayoutConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Bursary and approval endpoints
    pub base_url: String,
    /// Payment gateway bridge
    pub payout_base_url: String,
    /// Login service
    pub auth_base_url: String,
    pub timeout_secs: u64,
    /// Local development hosts serve self-signed certificates
    pub accept_invalid_certs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:7094".to_string(),
            payout_base_url: "https://localhost:7124".to_string(),
            auth_base_url: "http://localhost:8084".to_string(),
            timeout_secs: 30,
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ApprovalConfig {
    pub policy: ExecutionPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PayoutConfig {
    /// Send every payout item to this address instead of the applicant's email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_override: Option<String>,
    pub email_subject: String,
    pub email_message: String,
    pub currency: Currency,
    /// Applied amounts are divided by this before being sent to the gateway
    pub minor_unit_divisor: f64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            receiver_override: None,
            email_subject: "Bursary Payment Notification".to_string(),
            email_message: "Your bursary payment has been processed.".to_string(),
            currency: Currency::USD,
            minor_unit_divisor: 100.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "bursary-session.db".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("BURSARY").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.listing.page_size == 0 {
            anyhow::bail!("listing.page_size must be at least 1");
        }
        if let ExecutionPolicy::BoundedParallel { max_in_flight } = self.approval.policy {
            if max_in_flight == 0 {
                anyhow::bail!("approval.policy.max_in_flight must be at least 1");
            }
        }
        if !(self.payout.minor_unit_divisor > 0.0) {
            anyhow::bail!("payout.minor_unit_divisor must be positive");
        }
        Ok(())
    }

    /// Render as the TOML written by `init`
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listing.page_size, 10);
        assert_eq!(config.approval.policy, ExecutionPolicy::Sequential);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = Config::default();
        config.listing.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_keeps_policy() {
        let mut config = Config::default();
        config.approval.policy = ExecutionPolicy::BoundedParallel { max_in_flight: 3 };

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("bounded_parallel"));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(
            parsed.approval.policy,
            ExecutionPolicy::BoundedParallel { max_in_flight: 3 }
        );
    }
}
