//! Liquidity discovery over a list of securities.
//!
//! Two entry points share one loop:
//! - `discover_tickers()`: screens common stocks from the NASDAQ directory.
//! - `discover_etfs()`: screens the non-NASDAQ directory and flags leveraged
//!   or inverse funds among the accepted symbols.
//!
//! A broker error for one symbol is recorded and the loop moves on.

use std::collections::HashSet;

use tracing::{info, warn};

use tickerflow_core::data::{HistoricalDataSource, RateLimiter};
use tickerflow_core::domain::{Bar, ListedSecurity};
use tickerflow_core::screen::{LeverageClassifier, LiquidityFilter, LiquidityVerdict};

use crate::config::PipelineConfig;
use crate::error::RunError;
use crate::summary::{OutcomeStatus, Pipeline, RunSummary, SkipReason};

/// Screen `securities` by average dollar volume.
pub fn discover_tickers(
    config: &PipelineConfig,
    broker: &dyn HistoricalDataSource,
    limiter: &mut dyn RateLimiter,
    securities: &[ListedSecurity],
) -> Result<RunSummary, RunError> {
    config.validate()?;
    Ok(screen_securities(
        Pipeline::TickerDiscovery,
        config,
        broker,
        limiter,
        securities,
        None,
    ))
}

/// Screen ETFs by average dollar volume and classify the survivors by name.
pub fn discover_etfs(
    config: &PipelineConfig,
    broker: &dyn HistoricalDataSource,
    limiter: &mut dyn RateLimiter,
    securities: &[ListedSecurity],
) -> Result<RunSummary, RunError> {
    config.validate()?;
    let classifier = config.leverage_classifier()?;
    Ok(screen_securities(
        Pipeline::EtfDiscovery,
        config,
        broker,
        limiter,
        securities,
        Some(&classifier),
    ))
}

fn screen_securities(
    pipeline: Pipeline,
    config: &PipelineConfig,
    broker: &dyn HistoricalDataSource,
    limiter: &mut dyn RateLimiter,
    securities: &[ListedSecurity],
    classifier: Option<&LeverageClassifier>,
) -> RunSummary {
    let filter = config.liquidity_filter();
    let lookback = config.lookback_for(pipeline);
    let unique = unique_securities(securities);
    let total = unique.len();

    info!(
        pipeline = pipeline.name(),
        symbols = total,
        threshold_usd = filter.threshold_usd(),
        %lookback,
        source = broker.name(),
        "starting discovery"
    );

    let mut summary = RunSummary::new(pipeline);
    for (i, security) in unique.iter().enumerate() {
        let symbol = security.symbol.as_str();
        limiter.wait();

        let status = match broker.daily_bars(symbol, lookback) {
            Ok(bars) => classify(&filter, classifier, security, &bars),
            Err(e) => {
                warn!(symbol, error = %e, "broker request failed");
                OutcomeStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        log_outcome(i + 1, total, symbol, &status);
        summary.record(symbol, status);
    }
    summary.finish();

    info!(
        pipeline = pipeline.name(),
        accepted = summary.accepted_count(),
        rejected = summary.rejected_count(),
        skipped = summary.skipped_count(),
        failed = summary.failed_count(),
        "discovery finished"
    );
    summary
}

fn classify(
    filter: &LiquidityFilter,
    classifier: Option<&LeverageClassifier>,
    security: &ListedSecurity,
    bars: &[Bar],
) -> OutcomeStatus {
    match filter.evaluate(bars) {
        LiquidityVerdict::Liquid(dollar_volume) => OutcomeStatus::Accepted {
            dollar_volume,
            leveraged: classifier.is_some_and(|c| c.is_leveraged(security.name_or_empty())),
        },
        LiquidityVerdict::Illiquid(dollar_volume) => OutcomeStatus::Rejected { dollar_volume },
        LiquidityVerdict::NoData => OutcomeStatus::Skipped {
            reason: SkipReason::NoData,
        },
    }
}

/// Drop repeated symbols, keeping the first listing row for each.
fn unique_securities(securities: &[ListedSecurity]) -> Vec<&ListedSecurity> {
    let mut seen = HashSet::new();
    securities
        .iter()
        .filter(|s| seen.insert(s.symbol.as_str()))
        .collect()
}

fn log_outcome(index: usize, total: usize, symbol: &str, status: &OutcomeStatus) {
    match status {
        OutcomeStatus::Accepted {
            dollar_volume,
            leveraged,
        } => info!(index, total, symbol, dollar_volume, leveraged, "accepted"),
        OutcomeStatus::Rejected { dollar_volume } => {
            info!(index, total, symbol, dollar_volume, "below threshold")
        }
        OutcomeStatus::Skipped { .. } => info!(index, total, symbol, "no data"),
        OutcomeStatus::Failed { .. } | OutcomeStatus::Ingested { .. } => {}
    }
}
