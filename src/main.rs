use anyhow::Context;
use api_client::{provider_from_config, CredentialProvider, HttpVendorClient, VendorApi};
use chrono::Utc;
use clap::{Parser, Subcommand};
use configuration::Config;
use core_types::{OrderStatusFilter, Period};
use indicatif::{ProgressBar, ProgressStyle};
use orchestrator::{DashboardOrchestrator, FetchState};
use report::ExportFormat;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod render;
mod watch;

/// The main entry point for the vendor dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets such as the access token usually live in .env.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = configuration::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let _log_guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Show(args) => handle_show(args, &config).await,
        Commands::Export(args) => handle_export(args, &config).await,
        Commands::Orders(args) => handle_orders(args, &config).await,
        Commands::Watch => {
            let orchestrator = Arc::new(build_orchestrator(&config, None)?);
            watch::run(orchestrator, &config).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Sales and finance dashboard for marketplace vendors.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the dashboard once and print it.
    Show(ShowArgs),
    /// Load the dashboard and write a CSV or JSON report.
    Export(ExportArgs),
    /// List orders.
    Orders(OrdersArgs),
    /// Interactive session: switch periods, retry and export from stdin.
    Watch,
}

#[derive(Parser)]
struct ShowArgs {
    /// Reporting period: week, month, quarter or all.
    #[arg(long)]
    period: Option<Period>,
}

#[derive(Parser)]
struct ExportArgs {
    /// Reporting period: week, month, quarter or all.
    #[arg(long)]
    period: Option<Period>,

    /// Report format: csv or json.
    #[arg(long)]
    format: ExportFormat,

    /// Directory to write the report into. Defaults to `export.output_dir`.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct OrdersArgs {
    /// Status filter: all, completed, pending or refunded.
    #[arg(long, default_value = "all")]
    status: OrderStatusFilter,

    /// Maximum number of orders. Defaults to `dashboard.orders_limit`.
    #[arg(long)]
    limit: Option<u32>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn build_api(config: &Config) -> anyhow::Result<Arc<dyn VendorApi>> {
    let client = HttpVendorClient::new(&config.api).context("Failed to create the API client")?;
    Ok(Arc::new(client))
}

fn build_orchestrator(
    config: &Config,
    period: Option<Period>,
) -> anyhow::Result<DashboardOrchestrator> {
    let credentials = provider_from_config(&config.auth);
    tracing::debug!(provider = credentials.name(), "Credential provider selected.");
    Ok(DashboardOrchestrator::new(
        build_api(config)?,
        credentials,
        period.unwrap_or(config.dashboard.default_period),
    ))
}

/// Runs one cycle behind a spinner and returns the settled state.
async fn load_with_spinner(orchestrator: &DashboardOrchestrator) -> anyhow::Result<FetchState> {
    let period = orchestrator.period();
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Loading {} dashboard...", period));

    orchestrator.mount().await;

    spinner.finish_and_clear();
    Ok(orchestrator.state())
}

async fn handle_show(args: ShowArgs, config: &Config) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config, args.period)?;
    let state = load_with_spinner(&orchestrator).await?;
    render::render_state(&state);

    if let FetchState::Failed { reason, .. } = state {
        anyhow::bail!("Dashboard could not be loaded: {}", reason);
    }
    Ok(())
}

async fn handle_export(args: ExportArgs, config: &Config) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config, args.period)?;
    let state = load_with_spinner(&orchestrator).await?;
    if let FetchState::Failed { reason, .. } = &state {
        println!("⚠️  {}", reason);
    }

    let dir = args.output.unwrap_or_else(|| config.export.output_dir.clone());
    let snapshot = orchestrator.snapshot();
    let path = report::write_report(&dir, snapshot.as_deref(), args.format, Utc::now())?;
    println!("✅ {} report written to {}", args.format, path.display());
    Ok(())
}

async fn handle_orders(args: OrdersArgs, config: &Config) -> anyhow::Result<()> {
    let api = build_api(config)?;
    let credentials = provider_from_config(&config.auth);
    let limit = args.limit.unwrap_or(config.dashboard.orders_limit);

    let credential = credentials
        .credential()
        .await
        .context("Failed to acquire a credential")?;
    let orders = api
        .fetch_orders(&credential, args.status, limit)
        .await
        .context("Failed to fetch orders")?;

    tracing::info!(count = orders.len(), status = %args.status, limit, "Orders fetched.");
    println!("{}", render::orders_table(&orders));
    Ok(())
}
