//! OilRegime CLI: run the tiered pipeline and inspect its output.
//!
//! Commands:
//! - `bronze`: fetch every configured EIA series into a new bronze snapshot
//! - `silver`: align the latest bronze snapshots onto the weekly grid
//! - `gold`: derive features from the latest silver snapshots
//! - `load`: append the latest gold snapshots to the relational sink
//! - `run`: all four stages in order
//! - `snapshots`: list a table's snapshots and mark the one resolved as latest
//! - `signals`, `regime`, `forecast`: read back what the sink holds

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oilregime_core::domain::{TableLocation, Tier};
use oilregime_core::snapshot::{resolve_latest, SnapshotError, SystemClock};
use oilregime_core::source::EiaClient;
use oilregime_core::storage::{FsStore, SnapshotStore};
use oilregime_runner::{
    database_url, run_all, run_bronze, run_gold, run_silver, run_sink, PipelineConfig,
    RunSummary, SqliteSink,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "oilregime",
    about = "OilRegime CLI: bronze/silver/gold pipeline for EIA oil series"
)]
struct Cli {
    /// Pipeline config (TOML). Defaults to the built-in three-series pipeline.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the config's data root.
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch configured series from EIA into bronze (needs EIA_API_KEY).
    Bronze,
    /// Align latest bronze snapshots to week-ending Fridays.
    Silver,
    /// Derive weekly features from latest silver snapshots.
    Gold,
    /// Load latest gold snapshots into the relational sink (needs DATABASE_URL).
    Load,
    /// Run bronze, silver, gold and load in order.
    Run,
    /// List snapshots of one table.
    Snapshots {
        /// bronze, silver or gold.
        tier: Tier,
        /// Table name, e.g. silver_eia_prices.
        table: String,
    },
    /// Most recent feature rows for a commodity.
    Signals {
        commodity: String,

        /// Maximum rows, newest week first.
        #[arg(long, default_value_t = 52)]
        limit: usize,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Latest regime classification for a commodity.
    Regime { commodity: String },
    /// Latest forecast for a commodity and horizon.
    Forecast {
        commodity: String,

        #[arg(long, default_value_t = 4)]
        horizon_weeks: u32,
    },
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let config = load_config(cli.config, cli.data_root)?;
    let store = FsStore::new(&config.data_root);
    let clock = SystemClock;

    match cli.command {
        Commands::Bronze => {
            let source = EiaClient::from_env()?;
            report(&[run_bronze(&source, &store, &clock, &config)?])
        }
        Commands::Silver => report(&[run_silver(&store, &clock, &config)?]),
        Commands::Gold => report(&[run_gold(&store, &clock, &config)?]),
        Commands::Load => {
            let mut sink = open_sink()?;
            report(&[run_sink(&store, &mut sink, &config)?])
        }
        Commands::Run => {
            let source = EiaClient::from_env()?;
            let mut sink = open_sink()?;
            report(&run_all(&source, &store, &clock, &mut sink, &config)?)
        }
        Commands::Snapshots { tier, table } => {
            list_snapshots(&store, &TableLocation::new(tier, table))
        }
        Commands::Signals {
            commodity,
            limit,
            json,
        } => print_signals(&open_sink()?, &commodity, limit, json),
        Commands::Regime { commodity } => {
            match open_sink()?.latest_regime(&commodity)? {
                Some(r) => println!(
                    "{} week {}: {} (score {})",
                    r.commodity,
                    r.week,
                    r.regime_label,
                    r.regime_score.map_or("n/a".to_string(), |s| format!("{s:.4}"))
                ),
                None => not_found(&format!("no regime data for {commodity}")),
            }
            Ok(())
        }
        Commands::Forecast {
            commodity,
            horizon_weeks,
        } => {
            match open_sink()?.latest_forecast(&commodity, horizon_weeks)? {
                Some(f) => println!(
                    "{} week {} (+{}w): {:.4}",
                    f.commodity, f.week, f.horizon_weeks, f.forecast_value
                ),
                None => not_found(&format!(
                    "no {horizon_weeks}-week forecast for {commodity}"
                )),
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>, data_root: Option<PathBuf>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::from_file(&path)?,
        None => PipelineConfig::default(),
    };
    if let Some(root) = data_root {
        config.data_root = root;
    }
    Ok(config)
}

fn open_sink() -> Result<SqliteSink> {
    let url = database_url()?;
    SqliteSink::open(&url).with_context(|| format!("opening sink at {url}"))
}

/// Print every summary; exit 1 if any table failed.
fn report(summaries: &[RunSummary]) -> Result<()> {
    for summary in summaries {
        println!("{summary}");
    }
    if summaries.iter().any(|s| !s.all_succeeded()) {
        std::process::exit(1);
    }
    Ok(())
}

fn not_found(message: &str) {
    eprintln!("{message}");
    std::process::exit(1);
}

fn list_snapshots(store: &FsStore, location: &TableLocation) -> Result<()> {
    let latest = match resolve_latest(store, location) {
        Ok(latest) => latest,
        Err(SnapshotError::NotFound { .. }) => {
            println!("No snapshots for {location} under {}", store.root().display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut snapshots = store.list(location)?;
    snapshots.sort_by(|a, b| a.id.cmp(&b.id).then(a.format.cmp(&b.format)));

    println!("Table: {location}");
    println!("Snapshots: {}", snapshots.len());
    println!();
    println!("{:<18} {:<8} {:>10}", "Snapshot", "Format", "Size");
    println!("{}", "-".repeat(46));
    for snapshot in &snapshots {
        let marker = if *snapshot == latest { "  <- latest" } else { "" };
        println!(
            "{:<18} {:<8} {:>10}{marker}",
            snapshot.id.as_str(),
            snapshot.format.to_string(),
            format_size(store.size(snapshot)?)
        );
    }
    Ok(())
}

fn print_signals(sink: &SqliteSink, commodity: &str, limit: usize, json: bool) -> Result<()> {
    let rows = sink.recent_features(commodity, limit)?;
    if rows.is_empty() {
        not_found(&format!("no signals for {commodity}"));
        return Ok(());
    }

    if json {
        let signals: Vec<serde_json::Value> = rows
            .iter()
            .map(|r| {
                serde_json::json!({
                    "week": r.week.to_string(),
                    "feature_name": r.feature_name,
                    "feature_value": r.feature_value,
                })
            })
            .collect();
        let body = serde_json::json!({ "commodity": commodity, "signals": signals });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("{:<12} {:<20} {:>14}", "Week", "Feature", "Value");
    println!("{}", "-".repeat(48));
    for r in &rows {
        let value = r
            .feature_value
            .map_or("-".to_string(), |v| format!("{v:.6}"));
        println!("{:<12} {:<20} {:>14}", r.week.to_string(), r.feature_name, value);
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
