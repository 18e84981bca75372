//! Integration tests for daily ingestion against an in-memory SQLite store.

mod common;

use chrono::{DateTime, NaiveDate, Utc};
use common::{date, flat_bars, CountingLimiter, FakeBroker};
use tickerflow_core::data::Lookback;
use tickerflow_core::domain::Bar;
use tickerflow_core::store::{PriceStore, SqliteStore, StoreError};
use tickerflow_runner::{ingest_daily, OutcomeStatus, PipelineConfig, RunError, SkipReason};

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn run(broker: &FakeBroker, store: &mut SqliteStore, list: &[&str]) -> tickerflow_runner::RunSummary {
    let mut limiter = CountingLimiter::default();
    ingest_daily(
        &PipelineConfig::default(),
        broker,
        store,
        &mut limiter,
        &symbols(list),
    )
    .unwrap()
}

// ── Watermark ───────────────────────────────────────────────────────

#[test]
fn new_symbol_ingests_whole_window() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let broker = FakeBroker::new().with_bars("SPY", flat_bars(date(2015, 3, 2), 4, 200.0, 1e8));

    let summary = run(&broker, &mut store, &["SPY"]);

    assert_eq!(summary.bars_ingested(), 4);
    assert_eq!(store.price_rows("SPY").unwrap().len(), 4);
}

#[test]
fn bar_on_last_price_date_is_never_rewritten() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let last = date(2024, 6, 3);
    store
        .upsert_daily_bars("SPY", &[Bar::new(last, 1.0, 1.0, 1.0, 100.0, 10.0)])
        .unwrap();
    store.set_last_price_date("SPY", Some(last)).unwrap();

    let broker = FakeBroker::new().with_bars(
        "SPY",
        vec![
            Bar::new(last, 9.0, 9.0, 9.0, 999.0, 99.0),
            Bar::new(date(2024, 6, 4), 2.0, 2.0, 2.0, 101.0, 20.0),
        ],
    );

    let summary = run(&broker, &mut store, &["SPY"]);

    assert_eq!(
        summary.outcomes[0].status,
        OutcomeStatus::Ingested { new_bars: 1 }
    );
    let rows = store.price_rows("SPY").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].bar.date, last);
    assert_eq!(rows[0].bar.close, 100.0);
    assert_eq!(rows[1].bar.close, 101.0);
}

#[test]
fn rerun_without_new_data_leaves_prices_identical() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let broker = FakeBroker::new()
        .with_bars("SPY", flat_bars(date(2024, 1, 2), 5, 470.0, 7e7))
        .with_bars("QQQ", flat_bars(date(2024, 1, 2), 5, 400.0, 4e7));

    run(&broker, &mut store, &["SPY", "QQQ"]);
    let first = (
        store.price_rows("SPY").unwrap(),
        store.price_rows("QQQ").unwrap(),
    );
    run(&broker, &mut store, &["SPY", "QQQ"]);
    let second = (
        store.price_rows("SPY").unwrap(),
        store.price_rows("QQQ").unwrap(),
    );

    assert_eq!(first, second);
    assert_eq!(store.price_row_count().unwrap(), 10);
}

#[test]
fn rows_are_tagged_with_broker_source() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let broker = FakeBroker::new().with_bars("IWM", flat_bars(date(2024, 1, 2), 2, 200.0, 1e7));

    run(&broker, &mut store, &["IWM"]);

    assert!(store
        .price_rows("IWM")
        .unwrap()
        .iter()
        .all(|r| r.source == "IBKR"));
}

// ── Status ──────────────────────────────────────────────────────────

#[test]
fn ingest_timestamp_advances_with_zero_new_bars() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let last = date(2024, 6, 3);
    store.set_last_price_date("SPY", Some(last)).unwrap();
    let earlier: DateTime<Utc> = DateTime::parse_from_rfc3339("2024-06-03T21:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    store.touch_ingest_status("SPY", earlier).unwrap();

    let broker = FakeBroker::new().with_bars("SPY", flat_bars(date(2024, 5, 30), 5, 530.0, 5e7));
    let summary = run(&broker, &mut store, &["SPY"]);

    assert_eq!(
        summary.outcomes[0].status,
        OutcomeStatus::Ingested { new_bars: 0 }
    );
    assert_eq!(store.price_row_count().unwrap(), 0);
    assert!(store.last_ingest_ts("SPY").unwrap().unwrap() > earlier);
}

#[test]
fn empty_series_skips_without_touching_status() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let broker = FakeBroker::new().with_bars("QQQ", flat_bars(date(2024, 1, 2), 1, 400.0, 4e7));

    let summary = run(&broker, &mut store, &["GONE", "QQQ"]);

    assert_eq!(
        summary.outcomes[0].status,
        OutcomeStatus::Skipped {
            reason: SkipReason::NoData
        }
    );
    assert_eq!(store.last_ingest_ts("GONE").unwrap(), None);
    assert!(store.last_ingest_ts("QQQ").unwrap().is_some());
}

// ── Requests ────────────────────────────────────────────────────────

#[test]
fn ingestion_requests_ten_years_once_per_unique_symbol() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let broker = FakeBroker::new();
    let mut limiter = CountingLimiter::default();

    ingest_daily(
        &PipelineConfig::default(),
        &broker,
        &mut store,
        &mut limiter,
        &symbols(&["SPY", "QQQ", "SPY"]),
    )
    .unwrap();

    assert_eq!(broker.requested_symbols(), vec!["SPY", "QQQ"]);
    assert!(broker
        .requested_lookbacks()
        .iter()
        .all(|l| *l == Lookback::Years(10)));
    assert_eq!(limiter.permits, 2);
}

// ── Fatal errors ────────────────────────────────────────────────────

#[test]
fn broker_failure_aborts_but_keeps_earlier_symbols() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let broker = FakeBroker::new()
        .with_bars("SPY", flat_bars(date(2024, 1, 2), 3, 470.0, 7e7))
        .with_failure("BAD", "no security definition");
    let mut limiter = CountingLimiter::default();

    let err = ingest_daily(
        &PipelineConfig::default(),
        &broker,
        &mut store,
        &mut limiter,
        &symbols(&["SPY", "BAD", "QQQ"]),
    )
    .unwrap_err();

    assert!(matches!(err, RunError::Broker(_)));
    assert_eq!(store.price_rows("SPY").unwrap().len(), 3);
    assert_eq!(broker.requested_symbols(), vec!["SPY", "BAD"]);
}

/// Store whose bar upserts always fail.
struct ReadOnlyStore(SqliteStore);

impl PriceStore for ReadOnlyStore {
    fn last_price_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError> {
        self.0.last_price_date(symbol)
    }

    fn upsert_daily_bars(&mut self, symbol: &str, _bars: &[Bar]) -> Result<usize, StoreError> {
        Err(StoreError::InvalidDate {
            symbol: symbol.to_string(),
            value: "read-only".to_string(),
        })
    }

    fn touch_ingest_status(&mut self, symbol: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.0.touch_ingest_status(symbol, at)
    }
}

#[test]
fn store_failure_is_fatal_and_status_not_advanced() {
    let mut store = ReadOnlyStore(SqliteStore::open_in_memory().unwrap());
    let broker = FakeBroker::new().with_bars("SPY", flat_bars(date(2024, 1, 2), 3, 470.0, 7e7));
    let mut limiter = CountingLimiter::default();

    let err = ingest_daily(
        &PipelineConfig::default(),
        &broker,
        &mut store,
        &mut limiter,
        &symbols(&["SPY"]),
    )
    .unwrap_err();

    assert!(matches!(err, RunError::Store(_)));
    assert_eq!(store.0.last_ingest_ts("SPY").unwrap(), None);
}

#[test]
fn ingestion_into_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("stockdb.sqlite");
    let broker = FakeBroker::new().with_bars("DIA", flat_bars(date(2024, 1, 2), 2, 380.0, 3e6));

    {
        let mut store = SqliteStore::open(&db).unwrap();
        run(&broker, &mut store, &["DIA"]);
    }

    let store = SqliteStore::open(&db).unwrap();
    assert_eq!(store.price_rows("DIA").unwrap().len(), 2);
    assert!(store.last_ingest_ts("DIA").unwrap().is_some());
}
