//! FCC Census Area API county resolver
//!
//! `identify` calls `{base_url}?lat=..&lon=..&format=json` and takes the first
//! result. `severity` is answered from the local percentile tables.

use crate::domain::types::{CountyIdentity, LatLng};
use crate::error::ScoreError;
use crate::infra::config::Config;
use crate::io::county::CountyResolver;
use crate::io::percentile::PercentileTables;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct AreaResponse {
    #[serde(default)]
    results: Vec<AreaResult>,
}

#[derive(Debug, Deserialize)]
struct AreaResult {
    county_name: Option<String>,
    state_name: Option<String>,
    county_fips: Option<String>,
}

/// Extract the county from an FCC area response body
fn parse_area_response(body: &str, at: LatLng) -> Result<CountyIdentity, ScoreError> {
    let response: AreaResponse =
        serde_json::from_str(body).map_err(|e| ScoreError::Parse(e.to_string()))?;

    let Some(first) = response.results.into_iter().next() else {
        return Err(ScoreError::NoCounty(at.to_string()));
    };

    match (first.county_name, first.state_name, first.county_fips) {
        (Some(name), Some(state), Some(fips)) if !name.is_empty() && !fips.is_empty() => {
            Ok(CountyIdentity { name, state, fips })
        }
        _ => Err(ScoreError::NoCounty(at.to_string())),
    }
}

pub struct FccCountyResolver {
    client: reqwest::Client,
    base_url: String,
    tables: PercentileTables,
}

impl FccCountyResolver {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        tables: PercentileTables,
    ) -> Result<Self, ScoreError> {
        // Client is built once and shared across store tasks (connection pooling)
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.to_string(), tables })
    }

    pub fn from_config(config: &Config) -> Result<Self, ScoreError> {
        let tables =
            PercentileTables::load(config.percentile_primary(), config.percentile_backup());
        Self::new(
            config.fcc_base_url(),
            Duration::from_millis(config.county_timeout_ms()),
            tables,
        )
    }

    fn area_url(&self, at: LatLng) -> String {
        format!("{}?lat={}&lon={}&format=json", self.base_url, at.latitude, at.longitude)
    }
}

#[async_trait]
impl CountyResolver for FccCountyResolver {
    async fn identify(&self, at: LatLng) -> Result<CountyIdentity, ScoreError> {
        let start = Instant::now();
        let response = self.client.get(self.area_url(at)).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(location = %at, status = %status.as_u16(), "fcc_area_request_failed");
            return Err(ScoreError::Api { status: status.as_u16() });
        }

        let body = response.text().await?;
        let county = parse_area_response(&body, at)?;

        debug!(
            location = %at,
            county = %county,
            latency_ms = %start.elapsed().as_millis(),
            "fcc_area_resolved"
        );
        Ok(county)
    }

    async fn severity(&self, fips: &str) -> Result<f64, ScoreError> {
        Ok(self.tables.severity(fips))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::percentile::PercentileTable;

    const PHILADELPHIA: &str = r#"{
        "input": {"lat": 39.95, "lon": -75.16},
        "results": [
            {
                "block_fips": "421010005001000",
                "county_fips": "42101",
                "county_name": "Philadelphia",
                "state_fips": "42",
                "state_code": "PA",
                "state_name": "Pennsylvania"
            }
        ]
    }"#;

    fn at() -> LatLng {
        LatLng::new(39.95, -75.16)
    }

    #[test]
    fn test_parse_area_response() {
        let county = parse_area_response(PHILADELPHIA, at()).unwrap();
        assert_eq!(county.name, "Philadelphia");
        assert_eq!(county.state, "Pennsylvania");
        assert_eq!(county.fips, "42101");
    }

    #[test]
    fn test_parse_empty_results() {
        let err = parse_area_response(r#"{"results": []}"#, at()).unwrap_err();
        assert!(matches!(err, ScoreError::NoCounty(_)));
    }

    #[test]
    fn test_parse_null_county_outside_us() {
        let body = r#"{"results": [{"county_fips": null, "county_name": null, "state_name": null}]}"#;
        let err = parse_area_response(body, at()).unwrap_err();
        assert!(matches!(err, ScoreError::NoCounty(_)));
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_area_response("<html>", at()).unwrap_err();
        assert!(matches!(err, ScoreError::Parse(_)));
    }

    #[test]
    fn test_area_url() {
        let resolver = FccCountyResolver::new(
            "https://geo.fcc.gov/api/census/area",
            Duration::from_secs(1),
            PercentileTables::default(),
        )
        .unwrap();
        assert_eq!(
            resolver.area_url(at()),
            "https://geo.fcc.gov/api/census/area?lat=39.95&lon=-75.16&format=json"
        );
    }

    #[tokio::test]
    async fn test_severity_from_tables() {
        let tables = PercentileTables::new(
            PercentileTable::parse("fips,percentile\n42101,0.5\n"),
            PercentileTable::default(),
        );
        let resolver =
            FccCountyResolver::new("http://localhost", Duration::from_secs(1), tables).unwrap();
        assert_eq!(resolver.severity("42101").await.unwrap(), 5.0);
    }
}
