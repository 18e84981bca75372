//! Shared fakes for pipeline integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::NaiveDate;
use tickerflow_core::data::{BrokerError, HistoricalDataSource, Lookback, RateLimiter};
use tickerflow_core::domain::Bar;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` consecutive daily bars starting at `start`, all at `close` and `volume`.
pub fn flat_bars(start: NaiveDate, n: usize, close: f64, volume: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let d = start + chrono::Duration::days(i as i64);
            Bar::new(d, close, close, close, close, volume)
        })
        .collect()
}

enum Reply {
    Bars(Vec<Bar>),
    Fail(String),
}

/// In-memory broker with canned replies per symbol.
///
/// Unknown symbols return an empty series. Every request is logged.
#[derive(Default)]
pub struct FakeBroker {
    replies: HashMap<String, Reply>,
    requests: RefCell<Vec<(String, Lookback)>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.replies.insert(symbol.to_string(), Reply::Bars(bars));
        self
    }

    pub fn with_failure(mut self, symbol: &str, message: &str) -> Self {
        self.replies
            .insert(symbol.to_string(), Reply::Fail(message.to_string()));
        self
    }

    pub fn requested_symbols(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn requested_lookbacks(&self) -> Vec<Lookback> {
        self.requests.borrow().iter().map(|(_, l)| *l).collect()
    }
}

impl HistoricalDataSource for FakeBroker {
    fn name(&self) -> &str {
        "fake"
    }

    fn daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<Vec<Bar>, BrokerError> {
        self.requests
            .borrow_mut()
            .push((symbol.to_string(), lookback));
        match self.replies.get(symbol) {
            Some(Reply::Bars(bars)) => Ok(bars.clone()),
            Some(Reply::Fail(message)) => Err(BrokerError::Request {
                symbol: symbol.to_string(),
                message: message.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// Limiter that only counts permits.
#[derive(Debug, Default)]
pub struct CountingLimiter {
    pub permits: usize,
}

impl RateLimiter for CountingLimiter {
    fn wait(&mut self) {
        self.permits += 1;
    }
}
