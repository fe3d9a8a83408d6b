use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bursary-admin")]
#[command(about = "Bursary administration dashboard: review, approve and pay out applications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file and create the session database
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Sign in and remember the session
    Login {
        /// Phone number registered with the bursary office
        #[arg(short, long)]
        phone: String,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in identity
    Whoami,

    /// List applications visible to the signed-in user
    List {
        /// Case-insensitive search across name, admission number, school, course, year, status, amount and batch
        #[arg(short, long, default_value = "")]
        query: String,

        /// Filter by status (all, pending, approved, rejected)
        #[arg(short, long, default_value = "all")]
        status: String,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show one application with its approval record
    Show {
        /// Application id
        id: String,
    },

    /// Approve one or more Pending applications
    Approve {
        /// Application ids, processed in the given order
        #[arg(required_unless_present = "all_pending")]
        ids: Vec<String>,

        /// Select every Pending application instead of listing ids
        #[arg(long)]
        all_pending: bool,

        /// Amount allocated to each application
        #[arg(short, long)]
        amount: f64,

        /// Currency of the allocation (KES, USD)
        #[arg(long, default_value = "KES")]
        currency: String,

        /// Batch label; generated from the current time when omitted
        #[arg(short, long)]
        batch: Option<String>,

        /// Remark stored with the decision
        #[arg(short, long)]
        remark: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Reject one or more Pending applications
    Reject {
        /// Application ids, processed in the given order
        #[arg(required_unless_present = "all_pending")]
        ids: Vec<String>,

        /// Select every Pending application instead of listing ids
        #[arg(long)]
        all_pending: bool,

        /// Remark stored with the decision
        #[arg(short, long)]
        remark: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Edit profile or academic fields of an application
    Edit {
        /// Application id
        id: String,

        /// Field assignments such as `county=Kisumu` or `year_of_study=3`
        #[arg(required = true, value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },

    /// Pay out every Approved application in a batch
    Payout {
        /// Batch label to pay
        batch: String,

        /// Print the payload without sending it
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export a report
    Report {
        /// Report to export (applications, disbursements)
        #[arg(short, long, default_value = "applications")]
        kind: String,

        /// Output format (xlsx, csv, pdf)
        #[arg(short, long, default_value = "xlsx")]
        format: String,

        /// Disbursement status to keep (Disbursed, Withheld, In Progress)
        #[arg(long)]
        status: Option<String>,

        /// Directory the file is written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show dashboard statistics
    Stats {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Launch interactive TUI dashboard
    Tui,
}
