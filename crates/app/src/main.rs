use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use freshtrack_core::{AlertId, AppConfig, ItemId, ItemStatus, OcrConfig};
use freshtrack_ocr::{ExpiryPipeline, OcrBackend};
use tracing_subscriber::EnvFilter;

mod commands;
mod poller;

pub struct AppState {
    pub db: freshtrack_storage::DbPool,
    pub config: AppConfig,
}

/// Track perishable items and read expiry dates off label photos.
#[derive(Parser)]
#[command(name = "freshtrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file [default: <data dir>/config.toml]
    #[arg(short, long, global = true, env = "FRESHTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the item database
    #[arg(long, global = true, env = "FRESHTRACK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an item with a known expiry date
    Add {
        #[arg(short, long)]
        name: String,
        /// Expiry date (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_iso_date)]
        expiry: NaiveDate,
        /// Purchase date (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_iso_date)]
        purchased: Option<NaiveDate>,
    },

    /// Read the expiry date from a label photo and add the item
    Scan {
        image: PathBuf,
        #[arg(short, long, default_value = commands::DEFAULT_SCAN_NAME)]
        name: String,
    },

    /// List tracked items with their status
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Only show items with this status (expired, soon, safe)
        #[arg(long)]
        status: Option<ItemStatus>,
    },

    /// Remove an item
    Delete { id: i64 },

    /// Record and print alerts for items that are expired or about to expire
    Check,

    /// List recorded alerts
    Alerts {
        /// Include resolved alerts
        #[arg(long)]
        all: bool,
    },

    /// Mark an alert as resolved
    Resolve { id: i64 },

    /// Re-run the expiry check on the configured interval until interrupted
    Watch,
}

fn parse_iso_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "freshtrack", "freshtrack")
        .context("could not determine a home directory; pass --data-dir")?;
    Ok(dirs.data_dir().to_path_buf())
}

/// The single OCR engine for this process.
#[cfg(feature = "tesseract")]
fn build_recognizer(config: &OcrConfig) -> anyhow::Result<Arc<dyn OcrBackend>> {
    Ok(Arc::new(freshtrack_ocr::TesseractRecognizer::new(
        config.data_path.clone(),
        &config.language,
    )))
}

#[cfg(not(feature = "tesseract"))]
fn build_recognizer(_config: &OcrConfig) -> anyhow::Result<Arc<dyn OcrBackend>> {
    Err(freshtrack_ocr::OcrError::NotAvailable.into())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let config_path = cli.config.unwrap_or_else(|| data_dir.join("config.toml"));
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;

    let db_path = data_dir.join("items.db");
    let db = freshtrack_storage::create_db(&db_path)
        .await
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    let state = AppState { db, config };
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Add { name, expiry, purchased } => {
            let id = commands::add_item(&state, &name, expiry, purchased).await?;
            println!("Added {name} (#{id}), expires {expiry}");
        }
        Commands::Scan { image, name } => {
            let pipeline = ExpiryPipeline::with_config(
                build_recognizer(&state.config.ocr)?,
                state.config.extractor.clone(),
                state.config.ocr.clone(),
            );
            match commands::scan_item(&state, &pipeline, &image, &name).await? {
                commands::ScanOutcome::Added { id, expiry_date } => {
                    println!("Added {name} (#{id}) via OCR with expiry {expiry_date}");
                }
                commands::ScanOutcome::NoDate { raw_text } => {
                    println!("Could not detect expiry date from image.");
                    if !raw_text.is_empty() {
                        println!("Recognized text:\n{raw_text}");
                    }
                }
            }
        }
        Commands::List { json, status } => {
            let views = commands::list_items(&state, today, status).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                for v in &views {
                    println!(
                        "{:>5}  {:<30} {}  {:>5}d  {}",
                        v.id, v.name, v.expiry_date, v.days_left, v.status
                    );
                }
            }
        }
        Commands::Delete { id } => {
            let name = commands::delete_item(&state, ItemId(id)).await?;
            println!("{name} deleted successfully.");
        }
        Commands::Check => {
            for alert in poller::poll_once(&state.db, today, state.config.alerts.alert_days).await? {
                println!("{}", alert.message);
            }
        }
        Commands::Alerts { all } => {
            for alert in commands::list_alerts(&state, all).await? {
                let mark = if alert.resolved { "resolved" } else { "open" };
                println!("{:>5}  {}  {:<8}  {}", alert.id, alert.created_at, mark, alert.message);
            }
        }
        Commands::Resolve { id } => {
            commands::resolve_alert(&state, AlertId(id)).await?;
            println!("Alert #{id} resolved.");
        }
        Commands::Watch => {
            poller::run(&state.db, &state.config.alerts, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("Failed to listen for Ctrl-C: {e}");
                    std::future::pending::<()>().await;
                }
            })
            .await?;
        }
    }

    Ok(())
}
