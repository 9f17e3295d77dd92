// analytics-quota - Main Entry Point
//
// Command-line front end for the quota library:
// - dataset enumeration
// - row usage per dataset and in total
// - license row allotment
// - remaining capacity and full reports
//
// Results go to stdout, logs to stderr.

use analytics_quota::analytics::usage::sum_rows;
use analytics_quota::analytics::{DatasetEnumerator, HttpTransport, RowUsageAggregator};
use analytics_quota::config::Config;
use analytics_quota::license::{JsonFileLicenseSource, LicenseQuotaEvaluator};
use analytics_quota::QuotaService;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Analytics Quota: dataset row usage against license row allotment
#[derive(Parser, Debug)]
#[command(name = "analytics-quota")]
#[command(version)]
#[command(about = "Dataset row usage and license row allotment for analytics tenants", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every dataset id in the tenant
    Datasets,
    /// Total rows used across all dataset versions
    Usage {
        /// Print rows per dataset before the total
        #[arg(long)]
        by_dataset: bool,
    },
    /// Row allotment entitled by the Active license grants
    Allotment {
        /// JSON file of license grant records (overrides the config)
        #[arg(long)]
        grants: Option<PathBuf>,

        /// Print each contributing grant
        #[arg(long)]
        explain: bool,
    },
    /// Remaining row capacity (allotment minus usage, floored at zero)
    Remaining {
        /// JSON file of license grant records (overrides the config)
        #[arg(long)]
        grants: Option<PathBuf>,
    },
    /// Full quota report
    Report {
        /// JSON file of license grant records (overrides the config)
        #[arg(long)]
        grants: Option<PathBuf>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    init_tracing(&config, args.verbose)?;

    info!("analytics-quota v{} starting", env!("CARGO_PKG_VERSION"));

    match args.command {
        Commands::Datasets => list_datasets(&config).await,
        Commands::Usage { by_dataset } => show_usage(&config, by_dataset).await,
        Commands::Allotment { grants, explain } => show_allotment(&config, grants, explain).await,
        Commands::Remaining { grants } => show_remaining(&config, grants).await,
        Commands::Report { grants, json } => show_report(&config, grants, json).await,
    }
}

fn init_tracing(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose {
        Level::DEBUG
    } else {
        config.log_level()?
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format.to_lowercase().as_str() {
        "json" => builder.json().init(),
        "pretty" => builder.pretty().init(),
        _ => builder.compact().init(),
    }
    Ok(())
}

fn transport(config: &Config) -> Result<HttpTransport> {
    let platform = config.require_platform()?;
    HttpTransport::from_config(platform).context("Failed to create analytics transport")
}

fn license_source(config: &Config, grants: Option<PathBuf>) -> Result<JsonFileLicenseSource> {
    let path = grants
        .or_else(|| config.licenses.grants_file.clone())
        .context(
            "No license grant file configured. Pass --grants or set [licenses] grants_file",
        )?;
    Ok(JsonFileLicenseSource::new(path))
}

fn evaluator(config: &Config) -> LicenseQuotaEvaluator {
    LicenseQuotaEvaluator::new(config.licenses.premium_prefix.clone())
}

async fn list_datasets(config: &Config) -> Result<()> {
    let transport = transport(config)?;
    let endpoints = config.endpoints();

    let ids = DatasetEnumerator::new(&transport, &endpoints)
        .list_dataset_ids()
        .await
        .context("Failed to enumerate datasets")?;

    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

async fn show_usage(config: &Config, by_dataset: bool) -> Result<()> {
    let transport = transport(config)?;
    let endpoints = config.endpoints();
    let aggregator = RowUsageAggregator::new(&transport, &endpoints);

    if by_dataset {
        let usage = aggregator
            .usage_by_dataset()
            .await
            .context("Failed to aggregate row usage")?;
        let total = sum_rows(&usage).context("Failed to total row usage")?;
        for dataset in &usage {
            println!(
                "{}\t{} versions\t{} rows",
                dataset.dataset_id, dataset.versions, dataset.rows
            );
        }
        println!("total\t{}", total);
    } else {
        let total = aggregator
            .total_rows_used()
            .await
            .context("Failed to aggregate row usage")?;
        println!("{}", total);
    }
    Ok(())
}

async fn show_allotment(config: &Config, grants: Option<PathBuf>, explain: bool) -> Result<()> {
    let source = license_source(config, grants)?;

    let breakdown = evaluator(config)
        .evaluate_source(&source)
        .await
        .context("Failed to evaluate license allotment")?;

    if explain {
        for contribution in &breakdown.contributions {
            println!(
                "{}\t{}\t{}",
                contribution.label, contribution.rule, contribution.rows
            );
        }
        println!("premium_tier\t{}", breakdown.premium_tier);
        println!("total\t{}", breakdown.total);
    } else {
        println!("{}", breakdown.total);
    }
    Ok(())
}

async fn show_remaining(config: &Config, grants: Option<PathBuf>) -> Result<()> {
    let service = QuotaService::new(transport(config)?, license_source(config, grants)?)
        .with_endpoints(config.endpoints())
        .with_evaluator(evaluator(config));

    let remaining = service
        .get_remaining_capacity()
        .await
        .context("Failed to compute remaining capacity")?;

    println!("{}", remaining);
    Ok(())
}

async fn show_report(config: &Config, grants: Option<PathBuf>, json: bool) -> Result<()> {
    let service = QuotaService::new(transport(config)?, license_source(config, grants)?)
        .with_endpoints(config.endpoints())
        .with_evaluator(evaluator(config));

    let report = service
        .report()
        .await
        .context("Failed to compute quota report")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Generated:   {}", report.generated_at.to_rfc3339());
    println!("Datasets:    {}", report.datasets.len());
    println!("Rows used:   {}", report.quota.rows_used);
    println!("Allotted:    {}", report.quota.rows_allotted);
    println!("Remaining:   {}", report.quota.rows_remaining);
    println!("Utilization: {:.2}%", report.quota.utilization_percent());
    if report.quota.is_over_quota() {
        println!("Status:      OVER QUOTA");
    }
    Ok(())
}
