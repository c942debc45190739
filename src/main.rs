use table_filler::ingestion::IngestionResult;
use table_filler::{DedupScope, FillerConfig, StoreClient, TableFiller};

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "table-filler")]
#[command(about = "Upload record keys from a JSON or line-delimited file into a table")]
#[command(version)]
struct Args {
    /// Path to a file containing drivers' data (.json or one key per line)
    #[arg(long, default_value = "")]
    drivers: String,

    /// Drop the current table before uploading
    #[arg(long)]
    rewrite: bool,

    /// JSON config file (defaults apply for missing keys)
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite store file (or set FILLER_STORE); in-memory when unset
    #[arg(long)]
    store: Option<PathBuf>,

    /// Database name (or set FILLER_DATABASE)
    #[arg(long)]
    database: Option<String>,

    /// Table name (or set FILLER_TABLE)
    #[arg(long)]
    table: Option<String>,

    /// JSON pointer to the records array (default: /data/drivers)
    #[arg(long)]
    json_pointer: Option<String>,

    /// Only check keys against the table, not against earlier lines of the same file
    #[arg(long)]
    snapshot_only_dedup: bool,

    /// Print the ingestion result as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let drivers = drivers_path(&args)?;

    let config = build_config(&args, |name| std::env::var(name).ok())?;
    let client = config
        .open_store()
        .context("Failed to open store")?;

    let result = upload(&client, &config, &drivers, args.rewrite)
        .with_context(|| format!("Failed to upload {}", drivers.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("pushed: {}; duplicated: {}", result.accepted, result.duplicates);
    }
    Ok(())
}

/// A missing `--drivers` flag and an empty value are rejected alike
fn drivers_path(args: &Args) -> Result<PathBuf> {
    if args.drivers.is_empty() {
        bail!("data file path can't be empty");
    }
    Ok(PathBuf::from(&args.drivers))
}

/// Defaults, then config file, then environment, then flags
fn build_config<F>(args: &Args, env: F) -> Result<FillerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match &args.config {
        Some(path) => FillerConfig::load(path)?,
        None => FillerConfig::default(),
    };
    let mut config = config.apply_env_from(env)?;

    if let Some(store) = &args.store {
        config.store_path = Some(store.clone());
    }
    if let Some(database) = &args.database {
        config.database = database.clone();
    }
    if let Some(table) = &args.table {
        config.table = table.clone();
    }
    if let Some(pointer) = &args.json_pointer {
        config.ingestion.json_pointer = pointer.clone();
    }
    if args.snapshot_only_dedup {
        config.ingestion.dedup_scope = DedupScope::SnapshotOnly;
    }

    config.validate()?;
    Ok(config)
}

fn upload(
    client: &dyn StoreClient,
    config: &FillerConfig,
    drivers: &Path,
    rewrite: bool,
) -> table_filler::Result<IngestionResult> {
    let mut filler = TableFiller::new(client, config.database.clone())?
        .with_table(config.table.clone(), config.scheme.clone())
        .with_options(config.ingestion.clone());

    if rewrite {
        info!("Rewrite requested, dropping {}", filler.table_ref());
        filler.drop_table()?;
    }
    filler.create_table(None, None)?;
    filler.add(drivers)
}
