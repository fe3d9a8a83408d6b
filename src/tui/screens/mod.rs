pub mod applications;
pub mod dashboard;
pub mod payout;
pub mod reports;
pub mod settings;
