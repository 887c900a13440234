//! Configuration loading from TOML files
//!
//! The binary picks the file (`--config`, then `CONFIG_FILE`, then
//! `config/dev.toml`). Every key is optional; missing sections fall back to
//! defaults.

use crate::domain::check_in::{DayBoundary, ScoreWeights};
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Max stores scored at once (0 = one in-flight task per store)
    pub max_concurrency: usize,
    /// Per-store time limit in ms (0 to disable)
    pub store_timeout_ms: u64,
    /// Whole-batch deadline in ms (0 to disable)
    pub batch_deadline_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_concurrency: 0, store_timeout_ms: 10_000, batch_deadline_ms: 30_000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub busy_weight: f64,
    pub line_weight: f64,
    pub hygiene_weight: f64,
    pub mask_weight: f64,
    /// Share of the store score taken from the county severity
    pub county_weight: f64,
    pub day_boundary: DayBoundary,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let weights = ScoreWeights::default();
        Self {
            busy_weight: weights.busy_weight,
            line_weight: weights.line_weight,
            hygiene_weight: weights.hygiene_weight,
            mask_weight: weights.mask_weight,
            county_weight: default_county_weight(),
            day_boundary: DayBoundary::default(),
        }
    }
}

fn default_county_weight() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CountyConfig {
    /// FCC Census Area API endpoint
    pub fcc_base_url: String,
    pub timeout_ms: u64,
    /// Updated percentile table (checked first)
    pub percentile_primary: String,
    /// Backup percentile table
    pub percentile_backup: String,
}

impl Default for CountyConfig {
    fn default() -> Self {
        Self {
            fcc_base_url: "https://geo.fcc.gov/api/census/area".to_string(),
            timeout_ms: 5000,
            percentile_primary: "data/county_percentile_updated.csv".to_string(),
            percentile_backup: "data/county_percentile.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RatingsConfig {
    /// JSONL file of check-in ratings
    pub file: String,
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self { file: "data/ratings.jsonl".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Log a metrics summary after each batch
    pub log_summary: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { log_summary: true }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    pub batch: BatchConfig,
    pub scoring: ScoringConfig,
    pub county: CountyConfig,
    pub ratings: RatingsConfig,
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    max_concurrency: usize,
    store_timeout_ms: u64,
    batch_deadline_ms: u64,
    weights: ScoreWeights,
    county_weight: f64,
    day_boundary: DayBoundary,
    fcc_base_url: String,
    county_timeout_ms: u64,
    percentile_primary: String,
    percentile_backup: String,
    ratings_file: String,
    log_summary: bool,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default")
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: &str) -> Self {
        let scoring = toml_config.scoring;
        Self {
            max_concurrency: toml_config.batch.max_concurrency,
            store_timeout_ms: toml_config.batch.store_timeout_ms,
            batch_deadline_ms: toml_config.batch.batch_deadline_ms,
            weights: ScoreWeights {
                busy_weight: scoring.busy_weight,
                line_weight: scoring.line_weight,
                hygiene_weight: scoring.hygiene_weight,
                mask_weight: scoring.mask_weight,
            },
            county_weight: scoring.county_weight,
            day_boundary: scoring.day_boundary,
            fcc_base_url: toml_config.county.fcc_base_url,
            county_timeout_ms: toml_config.county.timeout_ms,
            percentile_primary: toml_config.county.percentile_primary,
            percentile_backup: toml_config.county.percentile_backup,
            ratings_file: toml_config.ratings.file,
            log_summary: toml_config.metrics.log_summary,
            config_file: config_file.to_string(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, &path.display().to_string()))
    }

    /// Load configuration from a path, falling back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn store_timeout(&self) -> Option<Duration> {
        (self.store_timeout_ms > 0).then(|| Duration::from_millis(self.store_timeout_ms))
    }

    pub fn batch_deadline(&self) -> Option<Duration> {
        (self.batch_deadline_ms > 0).then(|| Duration::from_millis(self.batch_deadline_ms))
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn county_weight(&self) -> f64 {
        self.county_weight
    }

    pub fn day_boundary(&self) -> DayBoundary {
        self.day_boundary
    }

    pub fn fcc_base_url(&self) -> &str {
        &self.fcc_base_url
    }

    pub fn county_timeout_ms(&self) -> u64 {
        self.county_timeout_ms
    }

    pub fn percentile_primary(&self) -> &str {
        &self.percentile_primary
    }

    pub fn percentile_backup(&self) -> &str {
        &self.percentile_backup
    }

    pub fn ratings_file(&self) -> &str {
        &self.ratings_file
    }

    pub fn log_summary(&self) -> bool {
        self.log_summary
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Override the concurrency bound
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Override the per-store timeout
    pub fn with_store_timeout_ms(mut self, ms: u64) -> Self {
        self.store_timeout_ms = ms;
        self
    }

    /// Override the batch deadline
    pub fn with_batch_deadline_ms(mut self, ms: u64) -> Self {
        self.batch_deadline_ms = ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_concurrency(), 0);
        assert_eq!(config.store_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.batch_deadline(), Some(Duration::from_secs(30)));
        assert_eq!(config.weights(), &ScoreWeights::default());
        assert_eq!(config.county_weight(), 0.5);
        assert_eq!(config.day_boundary(), DayBoundary::CalendarDate);
        assert_eq!(config.fcc_base_url(), "https://geo.fcc.gov/api/census/area");
        assert!(config.log_summary());
        assert_eq!(config.config_file(), "default");
    }

    #[test]
    fn test_zero_disables_timeouts() {
        let config = Config::default().with_store_timeout_ms(0).with_batch_deadline_ms(0);
        assert_eq!(config.store_timeout(), None);
        assert_eq!(config.batch_deadline(), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
[scoring]
mask_weight = 0.4
day_boundary = "weekday"
"#,
        )
        .unwrap();
        let config = Config::from_toml(toml_config, "inline");

        assert_eq!(config.weights().mask_weight, 0.4);
        assert_eq!(config.weights().busy_weight, 0.25);
        assert_eq!(config.day_boundary(), DayBoundary::Weekday);
        assert_eq!(config.ratings_file(), "data/ratings.jsonl");
    }
}
