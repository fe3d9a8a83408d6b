use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Identity;

/// The persisted sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub identity: Identity,
    pub signed_in_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(identity: Identity, signed_in_at: DateTime<Utc>) -> Self {
        Self {
            identity,
            signed_in_at,
        }
    }
}
