//! Incremental daily ingestion into the price store.
//!
//! For each symbol the stored `last_price_date` is the watermark: only bars
//! strictly after it are written. The ingest timestamp in `ticker_status`
//! advances on every attempt that returned bars, even when none were new.
//! Broker and store errors abort the run; symbols already processed stay
//! committed.

use chrono::{NaiveDate, Utc};
use tracing::info;

use tickerflow_core::data::{dedup_symbols, HistoricalDataSource, RateLimiter};
use tickerflow_core::domain::Bar;
use tickerflow_core::store::{default_last_price_date, PriceStore};

use crate::config::PipelineConfig;
use crate::error::RunError;
use crate::summary::{OutcomeStatus, Pipeline, RunSummary, SkipReason};

/// Keep only bars dated strictly after `last_date`.
pub fn filter_new_bars(bars: Vec<Bar>, last_date: NaiveDate) -> Vec<Bar> {
    bars.into_iter().filter(|b| b.date > last_date).collect()
}

/// Pull daily bars for every symbol and upsert the new ones.
pub fn ingest_daily(
    config: &PipelineConfig,
    broker: &dyn HistoricalDataSource,
    store: &mut dyn PriceStore,
    limiter: &mut dyn RateLimiter,
    symbols: &[String],
) -> Result<RunSummary, RunError> {
    config.validate()?;
    let lookback = config.lookback_for(Pipeline::DailyIngest);
    let symbols = dedup_symbols(symbols.iter().map(String::as_str));
    let total = symbols.len();

    info!(
        symbols = total,
        %lookback,
        source = broker.name(),
        "starting daily ingestion"
    );

    let mut summary = RunSummary::new(Pipeline::DailyIngest);
    for (i, symbol) in symbols.iter().enumerate() {
        let index = i + 1;
        let last_date = store
            .last_price_date(symbol)?
            .unwrap_or_else(default_last_price_date);

        limiter.wait();
        let bars = broker.daily_bars(symbol, lookback)?;
        if bars.is_empty() {
            info!(index, total, symbol = symbol.as_str(), "no data");
            summary.record(
                symbol,
                OutcomeStatus::Skipped {
                    reason: SkipReason::NoData,
                },
            );
            continue;
        }

        let fresh = filter_new_bars(bars, last_date);
        let new_bars = if fresh.is_empty() {
            0
        } else {
            store.upsert_daily_bars(symbol, &fresh)?
        };
        store.touch_ingest_status(symbol, Utc::now())?;

        info!(
            index,
            total,
            symbol = symbol.as_str(),
            %last_date,
            new_bars,
            "ingested"
        );
        summary.record(symbol, OutcomeStatus::Ingested { new_bars });
    }
    summary.finish();

    info!(
        ingested = summary.ingested_count(),
        skipped = summary.skipped_count(),
        bars = summary.bars_ingested(),
        "daily ingestion finished"
    );
    Ok(summary)
}
