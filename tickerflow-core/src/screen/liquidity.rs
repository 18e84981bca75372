//! Liquidity filter: gates symbols by average daily dollar volume.
//!
//! Dollar volume is `mean(close) * mean(volume)` over whatever bars the
//! broker returned for the lookback window. No outlier trimming, no
//! missing-day adjustment.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// Default liquidity threshold in USD.
pub const DEFAULT_LIQUIDITY_THRESHOLD_USD: f64 = 25_000_000.0;

/// Average closing price times average volume.
///
/// Returns `None` for an empty slice.
pub fn average_dollar_volume(bars: &[Bar]) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    let n = bars.len() as f64;
    let avg_close = bars.iter().map(|b| b.close).sum::<f64>() / n;
    let avg_volume = bars.iter().map(|b| b.volume).sum::<f64>() / n;
    Some(avg_close * avg_volume)
}

/// Outcome of running the liquidity filter on one symbol's bars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LiquidityVerdict {
    Liquid(f64),
    Illiquid(f64),
    NoData,
}

impl LiquidityVerdict {
    pub fn is_liquid(&self) -> bool {
        matches!(self, LiquidityVerdict::Liquid(_))
    }

    pub fn dollar_volume(&self) -> Option<f64> {
        match *self {
            LiquidityVerdict::Liquid(v) | LiquidityVerdict::Illiquid(v) => Some(v),
            LiquidityVerdict::NoData => None,
        }
    }
}

/// Threshold filter on average dollar volume. The comparison is inclusive.
#[derive(Debug, Clone, Copy)]
pub struct LiquidityFilter {
    threshold_usd: f64,
}

impl LiquidityFilter {
    /// Negative or non-finite thresholds are clamped to zero.
    pub fn new(threshold_usd: f64) -> Self {
        let threshold_usd = if threshold_usd.is_finite() && threshold_usd > 0.0 {
            threshold_usd
        } else {
            0.0
        };
        Self { threshold_usd }
    }

    pub fn threshold_usd(&self) -> f64 {
        self.threshold_usd
    }

    pub fn evaluate(&self, bars: &[Bar]) -> LiquidityVerdict {
        match average_dollar_volume(bars) {
            None => LiquidityVerdict::NoData,
            Some(v) if v >= self.threshold_usd => LiquidityVerdict::Liquid(v),
            Some(v) => LiquidityVerdict::Illiquid(v),
        }
    }
}

impl Default for LiquidityFilter {
    fn default() -> Self {
        Self::new(DEFAULT_LIQUIDITY_THRESHOLD_USD)
    }
}
