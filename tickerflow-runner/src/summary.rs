//! Per-symbol outcomes and the run summary they aggregate into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tickerflow_core::data::Lookback;

/// Current schema version for serialized summaries.
pub const SCHEMA_VERSION: u32 = 1;

/// Which pipeline produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    TickerDiscovery,
    EtfDiscovery,
    DailyIngest,
}

impl Pipeline {
    pub fn name(&self) -> &'static str {
        match self {
            Pipeline::TickerDiscovery => "ticker_discovery",
            Pipeline::EtfDiscovery => "etf_discovery",
            Pipeline::DailyIngest => "daily_ingest",
        }
    }

    /// Each pipeline uses its own IB client id so they can run side by side.
    pub fn default_client_id(&self) -> i32 {
        match self {
            Pipeline::DailyIngest => 1,
            Pipeline::TickerDiscovery => 2,
            Pipeline::EtfDiscovery => 3,
        }
    }

    pub fn default_lookback(&self) -> Lookback {
        match self {
            Pipeline::TickerDiscovery | Pipeline::EtfDiscovery => Lookback::DISCOVERY,
            Pipeline::DailyIngest => Lookback::INGESTION,
        }
    }
}

/// Why a symbol produced no result without being an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The broker returned an empty bar series.
    NoData,
}

/// What happened to one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Passed the liquidity screen.
    Accepted { dollar_volume: f64, leveraged: bool },
    /// Below the liquidity threshold.
    Rejected { dollar_volume: f64 },
    /// Ingestion ran; `new_bars` may be zero.
    Ingested { new_bars: usize },
    Skipped { reason: SkipReason },
    /// Broker request failed; the loop moved on.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolOutcome {
    /// 1-based position in the processed list.
    pub index: usize,
    pub symbol: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Aggregated result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub pipeline: Pipeline,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<SymbolOutcome>,
}

impl RunSummary {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            pipeline,
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, symbol: &str, status: OutcomeStatus) {
        let index = self.outcomes.len() + 1;
        self.outcomes.push(SymbolOutcome {
            index,
            symbol: symbol.to_string(),
            status,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn accepted_count(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Accepted { .. }))
    }

    pub fn rejected_count(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Rejected { .. }))
    }

    pub fn ingested_count(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Ingested { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Skipped { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Failed { .. }))
    }

    /// Symbols that passed the liquidity screen, in processing order.
    pub fn accepted_symbols(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Accepted { .. }))
            .map(|o| o.symbol.as_str())
            .collect()
    }

    /// Accepted symbols classified as leveraged or inverse.
    pub fn leveraged_symbols(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Accepted { leveraged: true, .. }))
            .map(|o| o.symbol.as_str())
            .collect()
    }

    /// Total bars written across all ingested symbols.
    pub fn bars_ingested(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                OutcomeStatus::Ingested { new_bars } => new_bars,
                _ => 0,
            })
            .sum()
    }

    /// Failed symbols with their error text.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            OutcomeStatus::Failed { error } => Some((o.symbol.as_str(), error.as_str())),
            _ => None,
        })
    }
}
