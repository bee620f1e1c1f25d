use anyhow::Context;
use calculator::{CombinedMetricsRecord, MetricsCalculator};
use clap::{Parser, Subcommand};
use collectors::{
    AdsCollector, Collector, EventsCollector, ExpensesCollector, RetryPolicy,
    SecondaryTicketsCollector, collect_all,
};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use configuration::credentials::SECONDARY_SESSION_KEY;
use configuration::{CredentialStore, Secret, Secrets, Settings};
use core_types::{SnapshotBundle, SourceSnapshot};
use dashboard::DashboardClient;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

/// The main entry point for the Pulse metrics pipeline.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets usually come from a .env file, but the real environment is enough.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = configuration::load_config_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let _log_guard = configuration::logging::init_tracing(&settings.logging)?;

    match cli.command {
        Commands::Run(args) => handle_run(args, &settings).await,
        Commands::Calculate(args) => handle_calculate(args, &settings),
        Commands::CheckSession(args) => handle_check_session(args, &settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Collects marketing spend and ticket revenue, computes the combined metrics and
/// publishes them to the dashboard.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect every source, calculate the metrics and push them to the dashboard.
    Run(RunArgs),
    /// Calculate metrics offline from a JSON file of source snapshots.
    Calculate(CalculateArgs),
    /// Check whether the secondary marketplace session key is still accepted.
    CheckSession(CheckSessionArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// A fresh secondary marketplace session key, replacing the one from the environment.
    #[arg(long)]
    session_key: Option<String>,

    /// Calculate and log the metrics without pushing them.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Parser)]
struct CalculateArgs {
    /// A JSON array of tagged source snapshots.
    #[arg(long)]
    input: PathBuf,

    /// Print the full record as JSON instead of a summary table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct CheckSessionArgs {
    /// The session key to check. Defaults to the one in the environment.
    #[arg(long)]
    session_key: Option<String>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_run(args: RunArgs, settings: &Settings) -> anyhow::Result<()> {
    let secrets = Secrets::from_env()?;
    let spend = settings.spend.constants()?;

    let credentials = Arc::new(CredentialStore::new(secrets.secondary_session_key.clone()));
    if let Some(key) = args.session_key {
        credentials.rotate(key)?;
        tracing::info!("Using the session key supplied on the command line");
    }

    // Built up front so a misconfigured dashboard fails before any collection.
    let dashboard = if args.dry_run {
        None
    } else {
        Some(DashboardClient::new(&settings.dashboard, secrets.dashboard_api_key.clone())?)
    };

    let retry = RetryPolicy::from(&settings.retry);
    let sources = &settings.sources;
    let collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(AdsCollector::new(&sources.ads, secrets.ads_access_token.clone(), retry)?),
        Arc::new(EventsCollector::new(&sources.events, &secrets.events_api_key, retry)?),
        Arc::new(SecondaryTicketsCollector::new(&sources.secondary, Arc::clone(&credentials), retry)?),
        Arc::new(ExpensesCollector::new(&sources.expenses, &secrets.expenses_api_token, retry)?),
    ];

    tracing::info!("Collecting data from all sources...");
    let bundle = collect_all(collectors).await?;

    let record = MetricsCalculator::from_settings(settings, spend).calculate_bundle(&bundle)?;
    log_summary(&record);

    match dashboard {
        Some(client) => client.push(&record).await?,
        None => tracing::info!("Dry run: skipping the dashboard push"),
    }
    Ok(())
}

fn handle_calculate(args: CalculateArgs, settings: &Settings) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let snapshots: Vec<SourceSnapshot> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of source snapshots", args.input.display()))?;
    let bundle = SnapshotBundle::from_snapshots(snapshots)?;

    let spend = settings.spend.constants()?;
    let record = MetricsCalculator::from_settings(settings, spend).calculate_bundle(&bundle)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", summary_table(&record));
        println!("{}", daily_table(&record));
    }
    Ok(())
}

async fn handle_check_session(args: CheckSessionArgs, settings: &Settings) -> anyhow::Result<()> {
    let key = args
        .session_key
        .or_else(|| std::env::var(SECONDARY_SESSION_KEY).ok())
        .map(Secret::new);
    let credentials = Arc::new(CredentialStore::new(key));
    let collector = SecondaryTicketsCollector::new(
        &settings.sources.secondary,
        credentials,
        RetryPolicy::from(&settings.retry),
    )?;

    if collector.check_session().await? {
        println!("Session key is valid.");
        Ok(())
    } else {
        anyhow::bail!("KEY_ERROR: the secondary marketplace session key is missing or expired")
    }
}

// ==============================================================================
// Output
// ==============================================================================

fn log_summary(record: &CombinedMetricsRecord) {
    tracing::info!(
        timestamp = %record.timestamp,
        total_spend = %record.total_spend.round_dp(2),
        paid_ads_spend = %record.paid_ads_spend.round_dp(2),
        influencer_spend = %record.influencer_spend.round_dp(2),
        total_revenue = %record.total_revenue.round_dp(2),
        net_revenue = %record.net_revenue.round_dp(2),
        total_guests = record.total_guests,
        cost_per_acquisition = %record.cost_per_acquisition.round_dp(2),
        average_ltv = %record.average_ltv.round_dp(2),
        operational_expenses = %record.operational_expenses.round_dp(2),
        "Metrics summary"
    );
    for day in &record.daily_breakdown {
        tracing::debug!(
            date = %day.date,
            gross = %day.gross_revenue,
            net = %day.net_revenue,
            guests = day.daily_guests,
            accumulated_guests = day.accumulated_guests,
            "Daily breakdown"
        );
    }
}

fn money(value: Decimal) -> String {
    format!("${}", value.round_dp(2))
}

fn summary_table(record: &CombinedMetricsRecord) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"]);

    let rows = [
        ("Total Marketing Spend", money(record.total_spend)),
        ("Ad Platform Spend", money(record.ad_platform_spend)),
        ("Paid Ads Spend", money(record.paid_ads_spend)),
        ("Influencer Spend", money(record.influencer_spend)),
        ("Revenue", money(record.total_revenue)),
        ("Net Revenue", money(record.net_revenue)),
        ("Tickets", record.total_guests.to_string()),
        ("Spend / Revenue", record.spend_to_revenue_ratio.round_dp(4).to_string()),
        ("Customer Acquisition Cost", money(record.cost_per_acquisition)),
        ("Customer Lifetime Value", money(record.average_ltv)),
        ("Operational Expenses", money(record.operational_expenses)),
        (
            "Active Ads",
            format!(
                "{} / {}",
                record.ad_metrics.active_ads_count, record.ad_metrics.total_ads_count
            ),
        ),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    table
}

fn daily_table(record: &CombinedMetricsRecord) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Date", "Gross (cum.)", "Net (cum.)", "Guests", "Guests (cum.)"]);
    for day in &record.daily_breakdown {
        table.add_row(vec![
            day.date.to_string(),
            money(day.gross_revenue),
            money(day.net_revenue),
            day.daily_guests.to_string(),
            day.accumulated_guests.to_string(),
        ]);
    }
    table
}
