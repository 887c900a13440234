//! County resolution interface
//!
//! Two lookups, both fallible:
//! - `identify` maps a coordinate to the county it falls in
//! - `severity` maps a county fips code to a 0-10 severity score
//!
//! Implementations own their fallback policy (e.g. backup tables, neutral score).

use crate::domain::types::{CountyIdentity, LatLng};
use crate::error::ScoreError;
use async_trait::async_trait;

#[async_trait]
pub trait CountyResolver: Send + Sync {
    /// Resolve the county containing `at`
    async fn identify(&self, at: LatLng) -> Result<CountyIdentity, ScoreError>;

    /// Resolve the severity score for a county fips code
    async fn severity(&self, fips: &str) -> Result<f64, ScoreError>;
}
