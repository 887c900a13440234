//! Integration tests for configuration loading

use shopsafe_engine::domain::check_in::{DayBoundary, ScoreWeights};
use shopsafe_engine::infra::Config;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[batch]
max_concurrency = 8
store_timeout_ms = 2500
batch_deadline_ms = 0

[scoring]
busy_weight = 0.4
line_weight = 0.2
hygiene_weight = 0.2
mask_weight = 0.2
county_weight = 0.7
day_boundary = "weekday"

[county]
fcc_base_url = "http://localhost:9000/area"
timeout_ms = 1500
percentile_primary = "/tmp/primary.csv"
percentile_backup = "/tmp/backup.csv"

[ratings]
file = "/tmp/ratings.jsonl"

[metrics]
log_summary = false
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.max_concurrency(), 8);
    assert_eq!(config.store_timeout(), Some(Duration::from_millis(2500)));
    assert_eq!(config.batch_deadline(), None);
    assert_eq!(
        config.weights(),
        &ScoreWeights { busy_weight: 0.4, line_weight: 0.2, hygiene_weight: 0.2, mask_weight: 0.2 }
    );
    assert_eq!(config.county_weight(), 0.7);
    assert_eq!(config.day_boundary(), DayBoundary::Weekday);
    assert_eq!(config.fcc_base_url(), "http://localhost:9000/area");
    assert_eq!(config.county_timeout_ms(), 1500);
    assert_eq!(config.percentile_primary(), "/tmp/primary.csv");
    assert_eq!(config.percentile_backup(), "/tmp/backup.csv");
    assert_eq!(config.ratings_file(), "/tmp/ratings.jsonl");
    assert!(!config.log_summary());
}

#[test]
fn test_invalid_toml_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[scoring]\nday_boundary = \"fortnightly\"\n").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.max_concurrency(), 0);
    assert_eq!(config.day_boundary(), DayBoundary::CalendarDate);
    assert_eq!(config.config_file(), "default");
}
