//! TickerFlow Core: domain types, screens, market data and price storage.
//!
//! This crate holds everything the pipelines build on:
//! - Domain types (daily bars, listed securities)
//! - Liquidity screen (average dollar volume threshold)
//! - Leveraged / inverse ETF name classifier
//! - Exchange listing parsing and download, curated ticker CSVs
//! - Broker abstraction with an Interactive Brokers implementation
//! - Fixed-interval request pacing
//! - Price store abstraction with a SQLite implementation

pub mod data;
pub mod domain;
pub mod screen;
pub mod store;
