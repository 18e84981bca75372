//! Fatal pipeline errors.

use thiserror::Error;
use tickerflow_core::data::{BrokerError, ListingError};
use tickerflow_core::store::StoreError;

use crate::config::ConfigError;

/// Errors that abort a pipeline run.
///
/// Per-symbol broker failures during discovery are not fatal; they end up in
/// the run summary instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("listing error: {0}")]
    Listing(#[from] ListingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
