//! Interactive Brokers historical data source.
//!
//! Wraps the blocking `ibapi` client. One connection is opened per process
//! and reused for every symbol. Requests are plain stock contracts routed
//! SMART in USD, daily TRADES bars, regular trading hours, ending now.
//!
//! No retry and no pacing logic live here: pacing is the rate limiter's job
//! and a failed request is reported to the caller as a `BrokerError`.

use super::provider::{BrokerError, HistoricalDataSource, Lookback};
use crate::domain::Bar;
use chrono::NaiveDate;
use ibapi::client::blocking::Client;
use ibapi::contracts::{Contract, SecurityType};
use ibapi::market_data::historical::{self, BarSize, ToDuration, WhatToShow};
use ibapi::market_data::TradingHours;
use tracing::{debug, info};

/// Connection parameters for IB Gateway / TWS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbConnection {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
}

impl IbConnection {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Historical data source backed by an IB Gateway / TWS session.
pub struct IbBroker {
    client: Client,
}

impl IbBroker {
    /// Connect to the gateway. Fails fast; there is no reconnect loop.
    pub fn connect(conn: &IbConnection) -> Result<Self, BrokerError> {
        let address = conn.address();
        let client = Client::connect(&address, conn.client_id).map_err(|e| BrokerError::Connect {
            address: address.clone(),
            message: e.to_string(),
        })?;
        info!(%address, client_id = conn.client_id, "connected to IB gateway");
        Ok(Self { client })
    }

    /// Stock contract with SMART routing and USD currency.
    fn stock_contract(symbol: &str) -> Contract {
        Contract {
            symbol: symbol.into(),
            security_type: SecurityType::Stock,
            exchange: "SMART".into(),
            currency: "USD".into(),
            ..Default::default()
        }
    }

    fn to_ib_duration(lookback: Lookback) -> historical::Duration {
        let count = |n: u32| i32::try_from(n).unwrap_or(i32::MAX);
        match lookback {
            Lookback::Days(n) => count(n).days(),
            Lookback::Weeks(n) => count(n).weeks(),
            Lookback::Months(n) => count(n).months(),
            Lookback::Years(n) => count(n).years(),
        }
    }

    fn convert_bar(symbol: &str, bar: &historical::Bar) -> Result<Bar, BrokerError> {
        let d = bar.date.date();
        let month = u32::from(u8::from(d.month()));
        let date = NaiveDate::from_ymd_opt(d.year(), month, u32::from(d.day()))
            .ok_or_else(|| BrokerError::MalformedBar {
                symbol: symbol.to_string(),
                message: format!("invalid bar date {}", bar.date),
            })?;
        Ok(Bar::new(date, bar.open, bar.high, bar.low, bar.close, bar.volume))
    }
}

impl HistoricalDataSource for IbBroker {
    fn name(&self) -> &str {
        "ibkr"
    }

    fn daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<Vec<Bar>, BrokerError> {
        let contract = Self::stock_contract(symbol);
        debug!(symbol, %lookback, "requesting daily bars");

        let data = self
            .client
            .historical_data(
                &contract,
                None,
                Self::to_ib_duration(lookback),
                BarSize::Day,
                WhatToShow::Trades,
                TradingHours::Regular,
            )
            .map_err(|e| BrokerError::Request {
                symbol: symbol.to_string(),
                message: e.to_string(),
            })?;

        data.bars
            .iter()
            .map(|bar| Self::convert_bar(symbol, bar))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_joins_host_and_port() {
        let conn = IbConnection {
            host: "127.0.0.1".into(),
            port: 4001,
            client_id: 1,
        };
        assert_eq!(conn.address(), "127.0.0.1:4001");
    }

    #[test]
    fn stock_contract_routes_smart_usd() {
        let contract = IbBroker::stock_contract("QQQ");
        assert_eq!(contract.symbol.to_string(), "QQQ");
        assert_eq!(contract.exchange.to_string(), "SMART");
        assert_eq!(contract.currency.to_string(), "USD");
    }
}
