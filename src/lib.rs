pub mod analytics;
pub mod api;
pub mod approval;
pub mod cli;
pub mod config;
pub mod error;
pub mod listing;
pub mod models;
pub mod payout;
pub mod reports;
pub mod storage;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use error::{BursaryError, Result};
