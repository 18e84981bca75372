//! Historical data source trait and structured broker error types.
//!
//! The `HistoricalDataSource` trait abstracts over the broker so pipelines can
//! run against Interactive Brokers in production and an in-memory fake in
//! tests.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structured error types for broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("failed to connect to broker at {address}: {message}")]
    Connect { address: String, message: String },

    #[error("historical data request for {symbol} failed: {message}")]
    Request { symbol: String, message: String },

    #[error("malformed bar for {symbol}: {message}")]
    MalformedBar { symbol: String, message: String },
}

/// Error parsing a lookback duration string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid lookback duration '{0}' (expected e.g. \"30 D\" or \"10 Y\")")]
pub struct LookbackParseError(pub String);

/// Historical window ending now, in IB duration units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Lookback {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
}

impl Lookback {
    /// 30 trading-calendar days, used by the discovery screens.
    pub const DISCOVERY: Lookback = Lookback::Days(30);
    /// 10 years, used by daily ingestion.
    pub const INGESTION: Lookback = Lookback::Years(10);
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookback::Days(n) => write!(f, "{n} D"),
            Lookback::Weeks(n) => write!(f, "{n} W"),
            Lookback::Months(n) => write!(f, "{n} M"),
            Lookback::Years(n) => write!(f, "{n} Y"),
        }
    }
}

impl FromStr for Lookback {
    type Err = LookbackParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || LookbackParseError(s.to_string());
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(err)?;
        let (count, unit) = trimmed.split_at(split);
        let count: u32 = count.parse().map_err(|_| err())?;
        if count == 0 {
            return Err(err());
        }
        match unit.trim().to_ascii_uppercase().as_str() {
            "D" => Ok(Lookback::Days(count)),
            "W" => Ok(Lookback::Weeks(count)),
            "M" => Ok(Lookback::Months(count)),
            "Y" => Ok(Lookback::Years(count)),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Lookback {
    type Error = LookbackParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Lookback> for String {
    fn from(value: Lookback) -> Self {
        value.to_string()
    }
}

/// Source of daily historical bars.
///
/// Implementations request a window of daily TRADES bars ending now,
/// regular trading hours only, routed SMART in USD. An empty vector means
/// the broker had no data; it is not an error.
pub trait HistoricalDataSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` over `lookback`, oldest first.
    fn daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<Vec<Bar>, BrokerError>;
}

impl<T: HistoricalDataSource + ?Sized> HistoricalDataSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<Vec<Bar>, BrokerError> {
        (**self).daily_bars(symbol, lookback)
    }
}
