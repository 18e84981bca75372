//! Market data acquisition: broker bars, exchange listings, request pacing.

pub mod ib;
pub mod listing;
pub mod provider;
pub mod rate_limit;

pub use ib::{IbBroker, IbConnection};
pub use listing::{
    dedup_symbols, download_listing, parse_etf_listing, parse_listing, parse_symbol_csv,
    read_etf_listing_file, read_listing_file, read_symbol_csv, ListingDownloader, ListingError,
    ListingFormat, NASDAQ_OTHER_LISTED_URL,
};
pub use provider::{BrokerError, HistoricalDataSource, Lookback, LookbackParseError};
pub use rate_limit::{FixedIntervalLimiter, NoopLimiter, RateLimiter};
