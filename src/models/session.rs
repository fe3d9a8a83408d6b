use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BursaryError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Bursary office staff (`ROLE_ADMIN`)
    Staff,
    /// Applicant (`ROLE_STUDENT`)
    Applicant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Staff => "ROLE_ADMIN",
            Role::Applicant => "ROLE_STUDENT",
            Role::Other(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ROLE_ADMIN" => Role::Staff,
            "ROLE_STUDENT" => Role::Applicant,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Staff => write!(f, "Staff"),
            Role::Applicant => write!(f, "Applicant"),
            Role::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// The signed-in user. Passed explicitly to every operation that needs it.
///
/// Role checks made against this value only shape what the client offers;
/// the remote API performs the real authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub display_name: String,
    pub phone: String,
    pub role: Role,
    pub email: String,
    pub national_id: String,
    pub token: Option<String>,
}

/// Which slice of the application list a user sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    ByPhone(String),
}

impl Identity {
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    pub fn list_scope(&self) -> Result<ListScope> {
        match &self.role {
            Role::Staff => Ok(ListScope::All),
            Role::Applicant => Ok(ListScope::ByPhone(self.phone.clone())),
            Role::Other(raw) => Err(BursaryError::Unauthorized(format!(
                "role '{}' cannot view applications",
                raw
            ))),
        }
    }

    pub fn require_staff(&self, action: &str) -> Result<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(BursaryError::Unauthorized(format!(
                "{} requires a staff account",
                action
            )))
        }
    }

    pub fn bearer_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BursaryError::Unauthorized("session has no access token".to_string()))
    }
}

#[cfg(test)]
pub(crate) fn staff_identity() -> Identity {
    Identity {
        display_name: "Grace Achieng".to_string(),
        phone: "0700000001".to_string(),
        role: Role::Staff,
        email: "grace@bursary.example".to_string(),
        national_id: "11223344".to_string(),
        token: Some("staff-token".to_string()),
    }
}

#[cfg(test)]
pub(crate) fn applicant_identity() -> Identity {
    Identity {
        display_name: "Brian Otieno".to_string(),
        phone: "0712345678".to_string(),
        role: Role::Applicant,
        email: "brian@student.example".to_string(),
        national_id: "55667788".to_string(),
        token: Some("student-token".to_string()),
    }
}
