use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Application, ApplicationStatus};

/// Counts and totals shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Sum of amounts applied for, per currency
    pub applied_totals: BTreeMap<String, f64>,
    /// Sum of amounts applied for on approved applications, per currency
    pub approved_totals: BTreeMap<String, f64>,
}

impl DashboardStats {
    pub fn from_applications(applications: &[Application]) -> Self {
        let mut stats = Self {
            total: applications.len(),
            ..Self::default()
        };

        for app in applications {
            let currency = app.amount_applied_for.currency.to_string();
            *stats.applied_totals.entry(currency.clone()).or_default() +=
                app.amount_applied_for.amount;

            match app.application_status {
                ApplicationStatus::Pending => stats.pending += 1,
                ApplicationStatus::Approved => {
                    stats.approved += 1;
                    *stats.approved_totals.entry(currency).or_default() +=
                        app.amount_applied_for.amount;
                }
                ApplicationStatus::Rejected => stats.rejected += 1,
            }
        }

        stats
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        match status {
            ApplicationStatus::Pending => self.pending,
            ApplicationStatus::Approved => self.approved,
            ApplicationStatus::Rejected => self.rejected,
        }
    }

    /// Share of processed applications that were approved, 0 when none
    pub fn approval_rate(&self) -> f64 {
        let processed = self.approved + self.rejected;
        if processed == 0 {
            0.0
        } else {
            self.approved as f64 / processed as f64 * 100.0
        }
    }
}

/// Latest by application date; undated rows lose to dated ones
pub fn most_recent(applications: &[Application]) -> Option<&Application> {
    applications
        .iter()
        .max_by_key(|app| app.application_date)
}
