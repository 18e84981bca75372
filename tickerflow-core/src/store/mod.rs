//! Price store: ingestion bookkeeping and the daily price table.
//!
//! Three tables back the daily ingestion pipeline:
//! - `tickers(symbol PK, last_price_date)`: read-only lookup of the last
//!   date already ingested for a symbol
//! - `ticker_status(symbol PK, last_ingest_ts)`: when ingestion last ran
//!   for a symbol
//! - `price_daily(symbol, ts, open, high, low, close, volume, source)`:
//!   unique on `(symbol, ts)`, written by upsert

pub mod sqlite;

pub use sqlite::{PriceRow, SqliteStore};

use crate::domain::Bar;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Source tag written on every `price_daily` row.
pub const SOURCE_TAG: &str = "IBKR";

/// Last price date assumed for a symbol never ingested before.
pub fn default_last_price_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).expect("2000-01-01 is a valid date")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("stored date '{value}' for {symbol} is not a valid date")]
    InvalidDate { symbol: String, value: String },
}

/// Persistence used by daily ingestion.
///
/// Each mutating call is its own transaction: a reader sees either all of a
/// symbol's bar batch or none of it.
pub trait PriceStore {
    /// Last ingested price date for `symbol`, if one is recorded.
    fn last_price_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError>;

    /// Upsert bars keyed by `(symbol, date)`, overwriting OHLCV and source on
    /// conflict. Returns the number of rows written.
    fn upsert_daily_bars(&mut self, symbol: &str, bars: &[Bar]) -> Result<usize, StoreError>;

    /// Record that ingestion ran for `symbol` at `at`.
    fn touch_ingest_status(&mut self, symbol: &str, at: DateTime<Utc>) -> Result<(), StoreError>;
}

impl<T: PriceStore + ?Sized> PriceStore for &mut T {
    fn last_price_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError> {
        (**self).last_price_date(symbol)
    }

    fn upsert_daily_bars(&mut self, symbol: &str, bars: &[Bar]) -> Result<usize, StoreError> {
        (**self).upsert_daily_bars(symbol, bars)
    }

    fn touch_ingest_status(&mut self, symbol: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).touch_ingest_status(symbol, at)
    }
}
