use chrono::Utc;
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bursary_admin::{
    analytics::{self, DashboardStats},
    api::{BursaryApi, HttpBursaryClient, LoginRequest},
    approval::{self, ApprovalForm, BatchApprovalProcessor, ItemOutcome, Selection},
    cli::{Cli, Commands},
    config::Config,
    error::{BursaryError, Result},
    listing::{self, StatusFilter},
    models::{ApplicationId, Currency, Identity, ListScope, Money},
    payout,
    reports::{self, ExportFormat, ReportKind},
    storage::{Database, SessionRecord},
    tui::{self, ActivityLog},
    utils,
};

const DEFAULT_LOG_FILTER: &str = "bursary_admin=info";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The TUI owns the terminal, so its log lines go to the activity panel
    let activity = ActivityLog::default();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let tui_mode = matches!(cli.command, Commands::Tui);
    if tui_mode {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(activity.clone())
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            if tui_mode {
                eprintln!("Failed to load configuration: {}", e);
            } else {
                error!("Failed to load configuration: {}", e);
            }
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Init { force } => initialize(&config, &cli.config, force),
        Commands::Login { phone, password } => login(&config, &phone, password).await,
        Commands::Logout => logout(&config),
        Commands::Whoami => whoami(&config),
        Commands::List {
            query,
            status,
            page,
            format,
        } => list_applications(&config, &query, &status, page, &format).await,
        Commands::Show { id } => show_application(&config, &id).await,
        Commands::Approve {
            ids,
            all_pending,
            amount,
            currency,
            batch,
            remark,
            yes,
        } => match currency.parse::<Currency>() {
            Ok(currency) => {
                let mut form = ApprovalForm::approve(Money::new(amount, currency));
                if let Some(batch) = batch {
                    form.set_batch_label(batch);
                }
                if let Some(remark) = remark {
                    form.set_remark(remark);
                }
                decide(&config, form, ids, all_pending, yes).await
            }
            Err(e) => Err(BursaryError::InvalidInput(e)),
        },
        Commands::Reject {
            ids,
            all_pending,
            remark,
            yes,
        } => {
            let mut form = ApprovalForm::reject();
            if let Some(remark) = remark {
                form.set_remark(remark);
            }
            decide(&config, form, ids, all_pending, yes).await
        }
        Commands::Edit { id, fields } => edit_application(&config, &id, &fields).await,
        Commands::Payout { batch, dry_run, yes } => {
            run_payout(&config, &batch, dry_run, yes).await
        }
        Commands::Report {
            kind,
            format,
            status,
            output,
        } => export_report(&config, &kind, &format, status.as_deref(), &output).await,
        Commands::Stats { format } => show_stats(&config, &format).await,
        Commands::Tui => run_tui(config, activity).await,
    };

    if let Err(e) = result {
        if tui_mode {
            // The activity panel is gone once the terminal is restored
            eprintln!("{}", format!("Error: {}", e).red());
        } else {
            error!("{}", format!("Error: {}", e).red());
        }
        std::process::exit(1);
    }
}

fn client(config: &Config) -> Result<HttpBursaryClient> {
    HttpBursaryClient::new(&config.api)
}

fn session(config: &Config) -> Result<Identity> {
    Database::new(&config.database.path)?.require_session()
}

fn initialize(config: &Config, path: &str, force: bool) -> Result<()> {
    println!("{}", "Initializing bursary admin...".green());

    if Path::new(path).exists() && !force {
        println!(
            "{}",
            format!("{} already exists; use --force to overwrite", path).yellow()
        );
    } else {
        std::fs::write(path, config.to_toml()?)?;
        println!("{}", format!("✓ Configuration written to {}", path).green());
    }

    let _db = Database::new(&config.database.path)?;
    println!("{}", "✓ Session database initialized".green());

    println!("\n{}", "Configuration:".cyan());
    println!("  Bursary API:    {}", config.api.base_url);
    println!("  Payout API:     {}", config.api.payout_base_url);
    println!("  Auth API:       {}", config.api.auth_base_url);
    println!("  Approval mode:  {:?}", config.approval.policy);
    println!("  Page size:      {}", config.listing.page_size);

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to sign in", "bursary-admin login --phone <number>".yellow());
    println!("  {} to review applications", "bursary-admin list".yellow());
    println!("  {} to launch TUI dashboard", "bursary-admin tui".yellow());
    Ok(())
}

async fn login(config: &Config, phone: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => utils::prompt("Password")?,
    };

    let response = client(config)?
        .login(&LoginRequest {
            phone_number: phone.trim().to_string(),
            password,
        })
        .await?;
    let identity = Identity::from(response);

    let db = Database::new(&config.database.path)?;
    db.save_session(&SessionRecord::new(identity.clone(), Utc::now()))?;
    info!("Signed in as {} ({})", identity.display_name, identity.role);

    println!(
        "{}",
        format!("✓ Welcome, {} ({})", identity.display_name, identity.role).green()
    );
    Ok(())
}

fn logout(config: &Config) -> Result<()> {
    let db = Database::new(&config.database.path)?;
    if db.clear_session()? {
        println!("{}", "✓ Signed out".green());
    } else {
        println!("{}", "No active session".yellow());
    }
    Ok(())
}

fn whoami(config: &Config) -> Result<()> {
    let db = Database::new(&config.database.path)?;
    match db.load_session()? {
        Some(record) => {
            let identity = record.identity;
            println!("{}", "=== Signed In ===".cyan().bold());
            println!("  Name:        {}", identity.display_name);
            println!("  Phone:       {}", identity.phone);
            println!("  Role:        {}", identity.role);
            println!("  Email:       {}", identity.email);
            println!("  National ID: {}", identity.national_id);
            println!("  Since:       {}", utils::format_timestamp(&record.signed_in_at));
        }
        None => println!("{}", "Not signed in".yellow()),
    }
    Ok(())
}

async fn list_applications(
    config: &Config,
    query: &str,
    status: &str,
    page: usize,
    format: &str,
) -> Result<()> {
    let identity = session(config)?;
    let status: StatusFilter = status.parse()?;
    let applications = client(config)?
        .list_applications(&identity.list_scope()?)
        .await?;

    let filtered = listing::filter(&applications, query, status);
    let page = listing::paginate(&filtered, page, config.listing.page_size);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&page.items)?);
        return Ok(());
    }

    if page.items.is_empty() {
        println!("{}", "No applications found".yellow());
        return Ok(());
    }

    let widths = [10, 24, 14, 20, 6, 10, 14, 16];
    utils::print_table_border(130);
    utils::print_table_row(
        &["ID", "Name", "Admission", "Course", "Year", "Status", "Amount", "Batch"],
        &widths,
    );
    utils::print_table_border(130);
    for app in &page.items {
        utils::print_table_row(
            &[
                app.id.as_str(),
                &app.applicant_full_name,
                &app.admission_number,
                &app.enrolled_course,
                &app.year_of_study,
                app.application_status.as_str(),
                &app.amount_applied_for.to_string(),
                app.batch_label().unwrap_or("-"),
            ],
            &widths,
        );
    }
    utils::print_table_border(130);
    println!("{}", page.label().dimmed());
    Ok(())
}

async fn show_application(config: &Config, id: &str) -> Result<()> {
    let _identity = session(config)?;
    let details = approval::load_details(&client(config)?, &ApplicationId::new(id)).await?;
    let app = &details.application;

    println!("{}", format!("=== Application {} ===", app.id).cyan().bold());
    println!("  Name:            {}", app.applicant_full_name);
    println!("  Phone:           {}", app.applicant_phone_number);
    println!("  Email:           {}", app.applicant_email);
    println!("  National ID:     {}", app.national_identification_number);
    println!("  Admission No:    {}", app.admission_number);
    println!("  School:          {}", app.school_name);
    println!("  Department:      {}", app.department_name);
    println!("  Course:          {}", app.enrolled_course);
    println!("  Year of Study:   {}", app.year_of_study);
    println!("  Previous Grade:  {}", app.previous_academic_year_grade);
    println!("  Sponsorship:     {}", app.sponsorship_type);
    println!("  Disability:      {}", app.any_form_of_disability);
    println!("  County:          {}", app.county);
    println!("  Amount Applied:  {}", app.amount_applied_for);
    if let Some(date) = &app.application_date {
        println!("  Applied On:      {}", utils::format_timestamp(date));
    }

    println!("\n{}", "Decision:".yellow());
    println!("  Status:          {}", utils::format_status(details.status));
    println!("  Allocated:       {}", details.allocation);
    println!(
        "  Batch:           {}",
        if details.batch_label.is_empty() { "-" } else { &details.batch_label }
    );
    if !details.remark.is_empty() {
        println!("  Remark:          {}", details.remark);
    }
    if let Some(approver) = &details.approver {
        println!("  Decided By:      {}", approver);
    }
    if let Some(date) = &details.approved_date {
        println!("  Decided On:      {}", utils::format_timestamp(date));
    }
    Ok(())
}

/// Approve or reject a selection through the batch processor
async fn decide(
    config: &Config,
    form: ApprovalForm,
    ids: Vec<String>,
    all_pending: bool,
    yes: bool,
) -> Result<()> {
    let identity = session(config)?;
    let approval = form.resolve(&identity, Utc::now())?;
    let api = client(config)?;
    let snapshot = api.list_applications(&ListScope::All).await?;

    let mut selection = Selection::new();
    let requested: Vec<ApplicationId> = if all_pending {
        selection.select_all_pending(&snapshot);
        selection.ids().to_vec()
    } else {
        let mut unique: Vec<ApplicationId> = Vec::new();
        for id in ids {
            let id = ApplicationId::new(id.trim());
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        unique
    };

    if requested.is_empty() {
        println!("{}", "No Pending applications to process".yellow());
        return Ok(());
    }

    println!("{}", format!("{} {} application(s)", approval.disposition, requested.len()).cyan());
    println!("  Allocation: {}", approval.allocation);
    println!("  Batch:      {}", approval.batch_label);
    println!("  Remark:     {}", approval.remark);

    if !yes
        && !utils::confirm_action(&format!(
            "Submit {} for {} application(s)?",
            approval.disposition,
            requested.len()
        ))?
    {
        println!("Cancelled");
        return Ok(());
    }

    let progress = ProgressBar::new(requested.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let bar = progress.clone();

    let processor = BatchApprovalProcessor::new(&api, config.approval.policy).with_observer(
        move |result| {
            bar.set_message(result.id.to_string());
            bar.inc(1);
        },
    );
    let outcome = processor
        .run(&approval, &requested, &snapshot, &ListScope::All)
        .await;
    progress.finish_and_clear();

    for result in &outcome.results {
        match &result.outcome {
            ItemOutcome::Success => println!("  {} {}", "✓".green(), result.id),
            ItemOutcome::Error { detail, .. } => {
                println!("  {} {}: {}", "✗".red(), result.id, detail)
            }
        }
    }

    if let Some(message) = outcome.refresh_error() {
        warn!("{}", message);
        println!("{}", message.yellow());
    }

    if outcome.settle(&mut selection) {
        // terminal bell as the completion sound
        print!("\x07");
        println!("{}", outcome.summary_message().green());
        Ok(())
    } else {
        println!("{}", outcome.summary_message().red());
        Err(BursaryError::Rejected(format!(
            "{} of {} item(s) failed",
            outcome.failed(),
            outcome.results.len()
        )))
    }
}

async fn edit_application(config: &Config, id: &str, fields: &[String]) -> Result<()> {
    let identity = session(config)?;
    let api = client(config)?;
    let mut details = approval::load_details(&api, &ApplicationId::new(id)).await?;

    for assignment in fields {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            BursaryError::InvalidInput(format!("expected FIELD=VALUE, got '{}'", assignment))
        })?;
        details.set_field(name, value)?;
    }

    let updated = approval::submit_profile_edit(&api, &identity, &details).await?;
    println!(
        "{}",
        format!("✓ Application {} updated", updated.application.id).green()
    );
    Ok(())
}

async fn run_payout(config: &Config, batch: &str, dry_run: bool, yes: bool) -> Result<()> {
    let identity = session(config)?;
    let api = client(config)?;

    let request = payout::prepare(&api, &identity, batch, &config.payout, Utc::now()).await?;
    println!(
        "{}",
        format!("Payout for batch {}: {} item(s)", batch.trim(), request.items.len()).cyan()
    );
    for item in &request.items {
        println!(
            "  {:<28} {} {:>12}  {}",
            item.sender_item_id, item.amount.currency, item.amount.value, item.receiver
        );
    }

    if dry_run {
        println!("\n{}", "DRY RUN: payload not sent".yellow());
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    if !yes && !utils::confirm_action("Send this payout?")? {
        println!("Cancelled");
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Sending payout...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    let result = payout::send(&api, &request).await;
    spinner.finish_and_clear();

    let response = result?;
    print!("\x07");
    println!("{}", "✓ Payout accepted".green());
    println!("  Batch ID: {}", response.batch_header.payout_batch_id);
    println!("  Status:   {}", response.batch_header.batch_status);
    Ok(())
}

async fn export_report(
    config: &Config,
    kind: &str,
    format: &str,
    status: Option<&str>,
    output: &Path,
) -> Result<()> {
    let identity = session(config)?;
    let kind: ReportKind = kind.parse()?;
    let format: ExportFormat = format.parse()?;

    let table = reports::load_report(&client(config)?, &identity, kind, status).await?;
    match reports::export(&table, format, output, Utc::now())? {
        Some(path) => {
            print!("\x07");
            println!(
                "{}",
                format!("✓ Exported {} row(s) to {}", table.len(), path.display()).green()
            );
        }
        None => println!("{}", "No data to export".yellow()),
    }
    Ok(())
}

async fn show_stats(config: &Config, format: &str) -> Result<()> {
    let identity = session(config)?;
    let applications = client(config)?
        .list_applications(&identity.list_scope()?)
        .await?;
    let stats = DashboardStats::from_applications(&applications);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== Bursary Statistics ===".cyan().bold());
    println!("\nApplications:");
    println!("  Total:      {}", stats.total);
    println!("  Pending:    {}", stats.pending.to_string().yellow());
    println!("  Approved:   {}", stats.approved.to_string().green());
    println!("  Rejected:   {}", stats.rejected.to_string().red());
    if identity.is_staff() {
        println!("  Approval rate: {:.1}%", stats.approval_rate());
    }

    println!("\nAmount applied for:");
    for (currency, total) in &stats.applied_totals {
        println!("  {}  {}", currency, utils::format_amount(*total));
    }

    if !identity.is_staff() {
        if let Some(latest) = analytics::most_recent(&applications) {
            println!("\n{}", "Latest application:".yellow());
            println!("  {} ({})", latest.id, utils::format_status(latest.application_status));
            println!("  {}", latest.amount_applied_for);
        }
    }
    Ok(())
}

async fn run_tui(config: Config, activity: ActivityLog) -> Result<()> {
    let identity = session(&config)?;
    let api = client(&config)?;
    tui::run(config, identity, std::sync::Arc::new(api), activity).await
}
