//! TickerFlow Runner: discovery and ingestion pipelines.
//!
//! This crate builds on `tickerflow-core` to provide:
//! - Pipeline configuration (TOML, per-pipeline defaults)
//! - Ticker and ETF liquidity discovery with per-symbol outcomes
//! - Incremental daily ingestion into the price store
//! - Run summaries with CSV and JSON export

pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod ingest;
pub mod summary;

pub use config::{ConfigError, PipelineConfig};
pub use discovery::{discover_etfs, discover_tickers};
pub use error::RunError;
pub use export::{
    export_summary_json, import_summary_json, symbol_csv, write_summary_json, write_symbol_csv,
};
pub use ingest::{filter_new_bars, ingest_daily};
pub use summary::{OutcomeStatus, Pipeline, RunSummary, SkipReason, SymbolOutcome};
