//! Per-store scoring: county, county severity, then check-ins
//!
//! A store is either fully enriched or dropped with a `DropReason`. No partial
//! result is ever produced.

use crate::domain::check_in::CheckInAggregator;
use crate::domain::types::{EnrichedStore, Store};
use crate::error::DropReason;
use crate::io::county::CountyResolver;
use crate::io::ratings::RatingSource;
use crate::services::county_cache::CountyScoreCache;
use std::sync::Arc;
use tracing::debug;

pub struct StoreScorer {
    resolver: Arc<dyn CountyResolver>,
    ratings: Arc<dyn RatingSource>,
    cache: Arc<CountyScoreCache>,
    aggregator: CheckInAggregator,
    county_weight: f64,
}

impl StoreScorer {
    pub fn new(
        resolver: Arc<dyn CountyResolver>,
        ratings: Arc<dyn RatingSource>,
        cache: Arc<CountyScoreCache>,
        aggregator: CheckInAggregator,
        county_weight: f64,
    ) -> Self {
        Self { resolver, ratings, cache, aggregator, county_weight }
    }

    pub async fn score(&self, store: &Store) -> Result<EnrichedStore, DropReason> {
        let county = self
            .resolver
            .identify(store.location)
            .await
            .map_err(|e| DropReason::CountyUnresolved(e.to_string()))?;

        // The fips code keys the severity cache; without it there is no county
        if county.fips.is_empty() {
            return Err(DropReason::CountyUnresolved("empty county identity".to_string()));
        }

        let county_score = self
            .cache
            .resolve(&county.fips)
            .await
            .map_err(|e| DropReason::SeverityUnavailable(e.to_string()))?;

        let mut records = self.ratings.fetch(&store.id).await;
        // Bucketing needs time order; stable and a no-op for well-behaved sources
        records.sort_by_key(|r| r.submitted_at);
        let stats = self.aggregator.aggregate(&records);

        debug!(
            store_id = %store.id,
            county = %county,
            county_score = %county_score,
            check_ins = %stats.composite.check_in_count,
            "store_scored"
        );

        Ok(EnrichedStore::new(store.clone(), county, county_score, stats, self.county_weight))
    }
}
