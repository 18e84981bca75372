//! TickerFlow CLI: discovery and ingestion commands.
//!
//! Commands:
//! - `discover-tickers`: screen the NASDAQ directory by average dollar volume
//! - `discover-etfs`: screen the non-NASDAQ directory and split out leveraged funds
//! - `ingest-daily`: append new daily bars for a curated ticker list
//!
//! Settings come from an optional TOML file; flags override file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tickerflow_core::data::{
    download_listing, read_etf_listing_file, read_listing_file, read_symbol_csv, IbBroker,
    ListingFormat, Lookback,
};
use tickerflow_core::store::SqliteStore;
use tickerflow_runner::{
    discover_etfs, discover_tickers, ingest_daily, write_summary_json, write_symbol_csv,
    Pipeline, PipelineConfig, RunSummary,
};

#[derive(Parser)]
#[command(
    name = "tickerflow",
    about = "TickerFlow CLI: IB liquidity discovery and daily price ingestion"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command.
#[derive(Args)]
struct CommonArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// IB Gateway / TWS host.
    #[arg(long)]
    host: Option<String>,

    /// IB Gateway / TWS port.
    #[arg(long)]
    port: Option<u16>,

    /// IB client id. Defaults to 2 / 3 / 1 for tickers / ETFs / ingest.
    #[arg(long)]
    client_id: Option<i32>,

    /// Seconds between broker requests.
    #[arg(long)]
    rate_limit: Option<f64>,

    /// Historical window, e.g. "30 D" or "10 Y".
    #[arg(long)]
    lookback: Option<Lookback>,

    /// Also write the run summary as JSON to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen NASDAQ-listed stocks by 30-day average dollar volume.
    DiscoverTickers {
        #[command(flatten)]
        common: CommonArgs,

        /// Pipe-delimited NASDAQ directory with a `Symbol` column.
        #[arg(long, default_value = "nasdaq.csv")]
        input: PathBuf,

        /// Output CSV of liquid symbols.
        #[arg(long, default_value = "tickers.csv")]
        output: PathBuf,

        /// Minimum average dollar volume in USD.
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Screen ETFs and write all liquid funds plus the leveraged subset.
    DiscoverEtfs {
        #[command(flatten)]
        common: CommonArgs,

        /// Read the directory from a local file instead of downloading it.
        #[arg(long)]
        listing_file: Option<PathBuf>,

        /// Directory URL. Overrides `etf_listing_url` from the config.
        #[arg(long)]
        url: Option<String>,

        /// Output CSV of liquid ETFs.
        #[arg(long, default_value = "etfs.csv")]
        output: PathBuf,

        /// Output CSV of liquid leveraged / inverse ETFs.
        #[arg(long, default_value = "leveraged_etfs.csv")]
        leveraged_output: PathBuf,

        /// Minimum average dollar volume in USD.
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Fetch daily bars and upsert everything newer than the stored watermark.
    IngestDaily {
        #[command(flatten)]
        common: CommonArgs,

        /// Curated CSV with a `symbol` column.
        #[arg(long, default_value = "tickers.csv")]
        symbols: PathBuf,

        /// SQLite database. Overrides `database_path` from the config.
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::DiscoverTickers {
            common,
            input,
            output,
            threshold,
        } => run_discover_tickers(&common, &input, &output, threshold),
        Commands::DiscoverEtfs {
            common,
            listing_file,
            url,
            output,
            leveraged_output,
            threshold,
        } => run_discover_etfs(
            &common,
            listing_file.as_deref(),
            url,
            &output,
            &leveraged_output,
            threshold,
        ),
        Commands::IngestDaily {
            common,
            symbols,
            database,
        } => run_ingest_daily(&common, &symbols, database),
    }
}

/// `RUST_LOG` controls verbosity; defaults to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// File values first, then flag overrides, then validation.
fn load_config(common: &CommonArgs) -> Result<PipelineConfig> {
    let mut config = match &common.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(host) = &common.host {
        config.broker_host = host.clone();
    }
    if let Some(port) = common.port {
        config.broker_port = port;
    }
    if let Some(id) = common.client_id {
        config.client_id = Some(id);
    }
    if let Some(seconds) = common.rate_limit {
        config.rate_limit_seconds = seconds;
    }
    if let Some(lookback) = common.lookback {
        config.lookback_duration = Some(lookback);
    }
    Ok(config)
}

fn run_discover_tickers(
    common: &CommonArgs,
    input: &Path,
    output: &Path,
    threshold: Option<f64>,
) -> Result<()> {
    let mut config = load_config(common)?;
    if let Some(t) = threshold {
        config.liquidity_threshold_usd = t;
    }
    config.validate()?;

    let listing = read_listing_file(input, ListingFormat::NASDAQ)?;
    let broker = IbBroker::connect(&config.connection(Pipeline::TickerDiscovery))?;
    let mut limiter = config.rate_limiter();

    let summary = discover_tickers(&config, &broker, &mut limiter, &listing)?;
    write_symbol_csv(output, &summary.accepted_symbols())?;

    print_summary(&summary);
    println!(
        "Saved {} tickers -> {}",
        summary.accepted_count(),
        output.display()
    );
    finish(&summary, common.summary_json.as_deref())
}

fn run_discover_etfs(
    common: &CommonArgs,
    listing_file: Option<&Path>,
    url: Option<String>,
    output: &Path,
    leveraged_output: &Path,
    threshold: Option<f64>,
) -> Result<()> {
    let mut config = load_config(common)?;
    if let Some(t) = threshold {
        config.liquidity_threshold_usd = t;
    }
    if let Some(url) = url {
        config.etf_listing_url = url;
    }
    config.validate()?;

    let listing = match listing_file {
        Some(path) => read_etf_listing_file(path)?,
        None => download_listing(&config.etf_listing_url)?,
    };
    let broker = IbBroker::connect(&config.connection(Pipeline::EtfDiscovery))?;
    let mut limiter = config.rate_limiter();

    let summary = discover_etfs(&config, &broker, &mut limiter, &listing)?;
    write_symbol_csv(output, &summary.accepted_symbols())?;
    write_symbol_csv(leveraged_output, &summary.leveraged_symbols())?;

    print_summary(&summary);
    println!(
        "Saved {} ETFs -> {}",
        summary.accepted_count(),
        output.display()
    );
    println!(
        "Saved {} leveraged/inverse ETFs -> {}",
        summary.leveraged_symbols().len(),
        leveraged_output.display()
    );
    finish(&summary, common.summary_json.as_deref())
}

fn run_ingest_daily(
    common: &CommonArgs,
    symbols_path: &Path,
    database: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(common)?;
    if let Some(db) = database {
        config.database_path = db;
    }
    config.validate()?;

    let symbols = read_symbol_csv(symbols_path)?;
    let mut store = SqliteStore::open(&config.database_path).with_context(|| {
        format!("failed to open database {}", config.database_path.display())
    })?;
    let broker = IbBroker::connect(&config.connection(Pipeline::DailyIngest))?;
    let mut limiter = config.rate_limiter();

    let summary = ingest_daily(&config, &broker, &mut store, &mut limiter, &symbols)?;

    print_summary(&summary);
    println!(
        "Wrote {} new bars into {}",
        summary.bars_ingested(),
        config.database_path.display()
    );
    finish(&summary, common.summary_json.as_deref())
}

fn print_summary(summary: &RunSummary) {
    println!("=== {} ===", summary.pipeline.name());
    println!("  Symbols:   {}", summary.total());
    match summary.pipeline {
        Pipeline::TickerDiscovery | Pipeline::EtfDiscovery => {
            println!("  Accepted:  {}", summary.accepted_count());
            println!("  Rejected:  {}", summary.rejected_count());
        }
        Pipeline::DailyIngest => {
            println!("  Ingested:  {}", summary.ingested_count());
            println!("  New bars:  {}", summary.bars_ingested());
        }
    }
    println!("  No data:   {}", summary.skipped_count());
    println!("  Failed:    {}", summary.failed_count());
    for (symbol, error) in summary.failures() {
        eprintln!("  {symbol}: {error}");
    }
}

fn finish(summary: &RunSummary, summary_json: Option<&Path>) -> Result<()> {
    if let Some(path) = summary_json {
        write_summary_json(path, summary)?;
        println!("Summary saved to: {}", path.display());
    }
    Ok(())
}
