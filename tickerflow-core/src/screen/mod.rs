//! Symbol screens: liquidity threshold and leveraged-name detection.

pub mod leverage;
pub mod liquidity;

pub use leverage::{LeverageClassifier, DEFAULT_LEVERAGED_MARKERS};
pub use liquidity::{
    average_dollar_volume, LiquidityFilter, LiquidityVerdict, DEFAULT_LIQUIDITY_THRESHOLD_USD,
};
