pub mod applications_table;
pub mod approval_form;
pub mod chart;
pub mod details;
pub mod header;
pub mod help;
pub mod logs;
pub mod stats;
