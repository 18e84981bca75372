//! Pipeline configuration loaded from TOML.
//!
//! Every key is optional; a missing file section falls back to the defaults
//! the pipelines have always used. `client_id` and `lookback_duration` have
//! per-pipeline defaults when left unset.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tickerflow_core::data::{FixedIntervalLimiter, IbConnection, Lookback, NASDAQ_OTHER_LISTED_URL};
use tickerflow_core::screen::{
    LeverageClassifier, LiquidityFilter, DEFAULT_LEVERAGED_MARKERS,
    DEFAULT_LIQUIDITY_THRESHOLD_USD,
};

use crate::summary::Pipeline;

/// Errors reading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

/// Settings shared by the three pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub broker_host: String,
    pub broker_port: u16,
    /// Unset means the pipeline's own default id.
    pub client_id: Option<i32>,
    pub rate_limit_seconds: f64,
    pub liquidity_threshold_usd: f64,
    /// Unset means the pipeline's own default window.
    pub lookback_duration: Option<Lookback>,
    pub database_path: PathBuf,
    pub etf_listing_url: String,
    pub leveraged_markers: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            broker_host: "127.0.0.1".to_string(),
            broker_port: 4001,
            client_id: None,
            rate_limit_seconds: 0.5,
            liquidity_threshold_usd: DEFAULT_LIQUIDITY_THRESHOLD_USD,
            lookback_duration: None,
            database_path: PathBuf::from("stockdb.sqlite"),
            etf_listing_url: NASDAQ_OTHER_LISTED_URL.to_string(),
            leveraged_markers: DEFAULT_LEVERAGED_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker_host.trim().is_empty() {
            return Err(invalid("broker_host", "must not be empty"));
        }
        if self.broker_port == 0 {
            return Err(invalid("broker_port", "must be non-zero"));
        }
        if !self.rate_limit_seconds.is_finite() || self.rate_limit_seconds < 0.0 {
            return Err(invalid(
                "rate_limit_seconds",
                format!("must be a non-negative number, got {}", self.rate_limit_seconds),
            ));
        }
        if !self.liquidity_threshold_usd.is_finite() || self.liquidity_threshold_usd < 0.0 {
            return Err(invalid(
                "liquidity_threshold_usd",
                format!(
                    "must be a non-negative number, got {}",
                    self.liquidity_threshold_usd
                ),
            ));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(invalid("database_path", "must not be empty"));
        }
        if self.etf_listing_url.trim().is_empty() {
            return Err(invalid("etf_listing_url", "must not be empty"));
        }
        if self.leveraged_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(invalid("leveraged_markers", "markers must not be blank"));
        }
        self.leverage_classifier()?;
        Ok(())
    }

    pub fn client_id_for(&self, pipeline: Pipeline) -> i32 {
        self.client_id
            .unwrap_or_else(|| pipeline.default_client_id())
    }

    pub fn lookback_for(&self, pipeline: Pipeline) -> Lookback {
        self.lookback_duration
            .unwrap_or_else(|| pipeline.default_lookback())
    }

    pub fn connection(&self, pipeline: Pipeline) -> IbConnection {
        IbConnection {
            host: self.broker_host.clone(),
            port: self.broker_port,
            client_id: self.client_id_for(pipeline),
        }
    }

    pub fn rate_limiter(&self) -> FixedIntervalLimiter {
        FixedIntervalLimiter::from_secs_f64(self.rate_limit_seconds)
    }

    pub fn liquidity_filter(&self) -> LiquidityFilter {
        LiquidityFilter::new(self.liquidity_threshold_usd)
    }

    pub fn leverage_classifier(&self) -> Result<LeverageClassifier, ConfigError> {
        LeverageClassifier::new(&self.leveraged_markers)
            .map_err(|e| invalid("leveraged_markers", e.to_string()))
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.broker_port, 4001);
        assert_eq!(config.rate_limit_seconds, 0.5);
        assert_eq!(config.database_path, PathBuf::from("stockdb.sqlite"));
        assert_eq!(config.leveraged_markers.len(), 8);
    }

    #[test]
    fn per_pipeline_defaults_apply_when_unset() {
        let config = PipelineConfig::default();
        assert_eq!(config.client_id_for(Pipeline::DailyIngest), 1);
        assert_eq!(config.client_id_for(Pipeline::TickerDiscovery), 2);
        assert_eq!(config.client_id_for(Pipeline::EtfDiscovery), 3);
        assert_eq!(config.lookback_for(Pipeline::TickerDiscovery), Lookback::Days(30));
        assert_eq!(config.lookback_for(Pipeline::DailyIngest), Lookback::Years(10));
    }

    #[test]
    fn explicit_values_override_pipeline_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            broker_host = "10.0.0.5"
            broker_port = 7497
            client_id = 42
            lookback_duration = "60 D"
            liquidity_threshold_usd = 1e7
            "#,
        )
        .unwrap();
        assert_eq!(config.client_id_for(Pipeline::EtfDiscovery), 42);
        assert_eq!(config.lookback_for(Pipeline::DailyIngest), Lookback::Days(60));
        let conn = config.connection(Pipeline::DailyIngest);
        assert_eq!(conn.address(), "10.0.0.5:7497");
        assert_eq!(conn.client_id, 42);
        assert_eq!(config.liquidity_filter().threshold_usd(), 1e7);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = PipelineConfig::from_toml("brokr_port = 4002").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bad_lookback_is_a_parse_error() {
        let err = PipelineConfig::from_toml(r#"lookback_duration = "ten years""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn negative_rate_limit_is_invalid() {
        let err = PipelineConfig::from_toml("rate_limit_seconds = -1.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "rate_limit_seconds",
                ..
            }
        ));
    }

    #[test]
    fn blank_marker_is_invalid() {
        let err = PipelineConfig::from_toml(r#"leveraged_markers = ["Ultra", " "]"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "leveraged_markers",
                ..
            }
        ));
    }

    #[test]
    fn custom_markers_drive_classifier() {
        let config = PipelineConfig::from_toml(r#"leveraged_markers = ["Daily"]"#).unwrap();
        let classifier = config.leverage_classifier().unwrap();
        assert!(classifier.is_leveraged("Direxion Daily Semiconductor Bull 3X"));
        assert!(!classifier.is_leveraged("ProShares Ultra QQQ"));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickerflow.toml");
        std::fs::write(&path, "rate_limit_seconds = 1.5\n").unwrap();
        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.rate_limit_seconds, 1.5);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/tickerflow.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
