//! SQLite-backed price store.
//!
//! Dates are stored as `YYYY-MM-DD` text and timestamps as RFC 3339 UTC text,
//! which sort correctly as strings.

use super::{PriceStore, StoreError, SOURCE_TAG};
use crate::domain::Bar;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

const CREATE_TABLES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS tickers (
    symbol TEXT PRIMARY KEY,
    last_price_date TEXT
);

CREATE TABLE IF NOT EXISTS ticker_status (
    symbol TEXT PRIMARY KEY,
    last_ingest_ts TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS price_daily (
    symbol TEXT NOT NULL,
    ts TEXT NOT NULL,
    open REAL NOT NULL,
    high REAL NOT NULL,
    low REAL NOT NULL,
    close REAL NOT NULL,
    volume REAL NOT NULL,
    source TEXT NOT NULL,
    UNIQUE(symbol, ts)
);
"#;

const UPSERT_PRICE_SQL: &str = r#"
INSERT INTO price_daily (symbol, ts, open, high, low, close, volume, source)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT (symbol, ts) DO UPDATE
SET open = excluded.open,
    high = excluded.high,
    low = excluded.low,
    close = excluded.close,
    volume = excluded.volume,
    source = excluded.source
"#;

const UPSERT_STATUS_SQL: &str = r#"
INSERT INTO ticker_status (symbol, last_ingest_ts)
VALUES (?1, ?2)
ON CONFLICT (symbol) DO UPDATE
SET last_ingest_ts = excluded.last_ingest_ts
"#;

/// One stored `price_daily` row.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub symbol: String,
    pub bar: Bar,
    pub source: String,
}

/// Price store on a single SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// In-memory database, mainly for tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_TABLES_SQL)?;
        Ok(Self { conn })
    }

    /// Set (or clear) the `tickers.last_price_date` lookup for a symbol.
    pub fn set_last_price_date(
        &mut self,
        symbol: &str,
        date: Option<NaiveDate>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO tickers (symbol, last_price_date) VALUES (?1, ?2)
             ON CONFLICT (symbol) DO UPDATE SET last_price_date = excluded.last_price_date",
            params![symbol, date.map(|d| d.to_string())],
        )?;
        Ok(())
    }

    /// All stored rows for a symbol, oldest first.
    pub fn price_rows(&self, symbol: &str) -> Result<Vec<PriceRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT ts, open, high, low, close, volume, source
             FROM price_daily WHERE symbol = ?1 ORDER BY ts",
        )?;
        let raw = stmt
            .query_map(params![symbol], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(ts, open, high, low, close, volume, source)| {
                let date = parse_stored_date(symbol, &ts)?;
                Ok(PriceRow {
                    symbol: symbol.to_string(),
                    bar: Bar::new(date, open, high, low, close, volume),
                    source,
                })
            })
            .collect()
    }

    /// Total number of `price_daily` rows.
    pub fn price_row_count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM price_daily", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Last recorded ingestion timestamp for a symbol.
    pub fn last_ingest_ts(&self, symbol: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT last_ingest_ts FROM ticker_status WHERE symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| StoreError::InvalidDate {
                    symbol: symbol.to_string(),
                    value: s.clone(),
                })
        })
        .transpose()
    }
}

impl PriceStore for SqliteStore {
    fn last_price_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError> {
        let raw: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT last_price_date FROM tickers WHERE symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )
            .optional()?;
        raw.flatten()
            .map(|s| parse_stored_date(symbol, &s))
            .transpose()
    }

    fn upsert_daily_bars(&mut self, symbol: &str, bars: &[Bar]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_PRICE_SQL)?;
            for bar in bars {
                stmt.execute(params![
                    symbol,
                    bar.date.to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume,
                    SOURCE_TAG,
                ])?;
            }
        }
        tx.commit()?;
        debug!(symbol, rows = bars.len(), "upserted daily bars");
        Ok(bars.len())
    }

    fn touch_ingest_status(&mut self, symbol: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            UPSERT_STATUS_SQL,
            params![symbol, at.to_rfc3339_opts(SecondsFormat::Micros, true)],
        )?;
        tx.commit()?;
        Ok(())
    }
}

/// Accepts `YYYY-MM-DD` optionally followed by a time part.
fn parse_stored_date(symbol: &str, value: &str) -> Result<NaiveDate, StoreError> {
    let date_part = value.trim().get(..10).unwrap_or(value.trim());
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| StoreError::InvalidDate {
        symbol: symbol.to_string(),
        value: value.to_string(),
    })
}
