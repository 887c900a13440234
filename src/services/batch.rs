//! Batch coordinator - fans stores out to concurrent scoring tasks and back in
//!
//! One task per store on a `JoinSet`, each with its own `StoreScorer` view of a
//! shared per-batch `CountyScoreCache`. The caller awaits until every task has
//! finished, been dropped by its per-store timeout, or been aborted by the
//! batch deadline. A failing store never affects its siblings.
//!
//! Outcomes are collected by input index, so `BatchReport::outcomes` follows
//! input order even though tasks complete in any order.

use crate::domain::check_in::CheckInAggregator;
use crate::domain::types::{BatchResult, EnrichedStore, Store, StoreId};
use crate::error::DropReason;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::county::CountyResolver;
use crate::io::ratings::RatingSource;
use crate::services::county_cache::CountyScoreCache;
use crate::services::store_scorer::StoreScorer;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of scoring one store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    Scored(EnrichedStore),
    Dropped { store_id: StoreId, reason: DropReason },
}

impl StoreOutcome {
    pub fn store_id(&self) -> &StoreId {
        match self {
            StoreOutcome::Scored(enriched) => &enriched.store.id,
            StoreOutcome::Dropped { store_id, .. } => store_id,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, StoreOutcome::Scored(_))
    }
}

/// Every store's outcome for one batch, in input order
#[derive(Debug)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub outcomes: Vec<StoreOutcome>,
    pub elapsed: Duration,
    pub county_lookups: u64,
    pub county_cache_hits: u64,
}

impl BatchReport {
    pub fn scored(&self) -> impl Iterator<Item = &EnrichedStore> {
        self.outcomes.iter().filter_map(|o| match o {
            StoreOutcome::Scored(enriched) => Some(enriched),
            StoreOutcome::Dropped { .. } => None,
        })
    }

    pub fn dropped(&self) -> impl Iterator<Item = (&StoreId, &DropReason)> {
        self.outcomes.iter().filter_map(|o| match o {
            StoreOutcome::Dropped { store_id, reason } => Some((store_id, reason)),
            StoreOutcome::Scored(_) => None,
        })
    }

    /// Flatten to successes only
    pub fn into_result(self) -> BatchResult {
        BatchResult::new(
            self.outcomes
                .into_iter()
                .filter_map(|o| match o {
                    StoreOutcome::Scored(enriched) => Some(enriched),
                    StoreOutcome::Dropped { .. } => None,
                })
                .collect(),
        )
    }
}

/// Fan-out limits for a batch
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSettings {
    /// 0 = every store in flight at once
    pub max_concurrency: usize,
    pub store_timeout: Option<Duration>,
    pub deadline: Option<Duration>,
}

impl BatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrency: config.max_concurrency(),
            store_timeout: config.store_timeout(),
            deadline: config.batch_deadline(),
        }
    }
}

pub struct BatchCoordinator {
    resolver: Arc<dyn CountyResolver>,
    ratings: Arc<dyn RatingSource>,
    aggregator: CheckInAggregator,
    county_weight: f64,
    settings: BatchSettings,
    metrics: Arc<Metrics>,
}

impl BatchCoordinator {
    pub fn new(
        resolver: Arc<dyn CountyResolver>,
        ratings: Arc<dyn RatingSource>,
        aggregator: CheckInAggregator,
        county_weight: f64,
        settings: BatchSettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { resolver, ratings, aggregator, county_weight, settings, metrics }
    }

    pub fn from_config(
        config: &Config,
        resolver: Arc<dyn CountyResolver>,
        ratings: Arc<dyn RatingSource>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self::new(
            resolver,
            ratings,
            CheckInAggregator::new(*config.weights(), config.day_boundary()),
            config.county_weight(),
            BatchSettings::from_config(config),
            metrics,
        )
    }

    /// Score every store and return the successes.
    ///
    /// Never fails: an empty result means no stores were given or none scored.
    pub async fn aggregate(&self, stores: Vec<Store>) -> BatchResult {
        self.run_detailed(stores).await.into_result()
    }

    /// Score every store and report each outcome
    pub async fn run_detailed(&self, stores: Vec<Store>) -> BatchReport {
        let batch_id = Uuid::now_v7();
        let start = Instant::now();
        let store_count = stores.len();

        info!(
            batch_id = %batch_id,
            stores = %store_count,
            max_concurrency = %self.settings.max_concurrency,
            "batch_started"
        );
        self.metrics.record_dispatched(store_count);

        // Cache lives for this batch only
        let cache = Arc::new(CountyScoreCache::new(self.resolver.clone()));
        let scorer = Arc::new(StoreScorer::new(
            self.resolver.clone(),
            self.ratings.clone(),
            cache.clone(),
            self.aggregator,
            self.county_weight,
        ));
        let gate = (self.settings.max_concurrency > 0)
            .then(|| Arc::new(Semaphore::new(self.settings.max_concurrency)));

        let store_ids: Vec<StoreId> = stores.iter().map(|s| s.id.clone()).collect();
        let mut set = JoinSet::new();
        let mut task_slots: FxHashMap<tokio::task::Id, usize> = FxHashMap::default();

        for (idx, store) in stores.into_iter().enumerate() {
            let scorer = scorer.clone();
            let gate = gate.clone();
            let store_timeout = self.settings.store_timeout;

            let handle = set.spawn(async move {
                // The semaphore is never closed
                let _permit = match gate {
                    Some(gate) => gate.acquire_owned().await.ok(),
                    None => None,
                };

                let result = match store_timeout {
                    Some(limit) => tokio::time::timeout(limit, scorer.score(&store))
                        .await
                        .unwrap_or(Err(DropReason::TimedOut)),
                    None => scorer.score(&store).await,
                };
                (idx, result)
            });
            task_slots.insert(handle.id(), idx);
        }

        let mut slots: Vec<Option<Result<EnrichedStore, DropReason>>> =
            (0..store_count).map(|_| None).collect();
        let deadline = self.settings.deadline.map(|d| tokio::time::Instant::now() + d);
        let mut deadline_hit = false;

        loop {
            let joined = match deadline {
                Some(at) => match tokio::time::timeout_at(at, set.join_next_with_id()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(batch_id = %batch_id, pending = %set.len(), "batch_deadline_exceeded");
                        deadline_hit = true;
                        set.abort_all();
                        break;
                    }
                },
                None => set.join_next_with_id().await,
            };

            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((_, (idx, result))) => slots[idx] = Some(result),
                Err(e) => {
                    warn!(batch_id = %batch_id, error = %e, "store_task_failed");
                    if let Some(&idx) = task_slots.get(&e.id()) {
                        slots[idx] = Some(Err(DropReason::TaskFailed(e.to_string())));
                    }
                }
            }
        }

        let outcomes: Vec<StoreOutcome> = store_ids
            .into_iter()
            .zip(slots)
            .map(|(store_id, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(if deadline_hit {
                        DropReason::DeadlineExceeded
                    } else {
                        DropReason::TaskFailed("task did not complete".to_string())
                    })
                });
                self.settle(batch_id, store_id, result)
            })
            .collect();

        let elapsed = start.elapsed();
        let report = BatchReport {
            batch_id,
            outcomes,
            elapsed,
            county_lookups: cache.lookups(),
            county_cache_hits: cache.hits(),
        };

        self.metrics.record_county_cache(report.county_lookups, report.county_cache_hits);
        self.metrics.record_batch(elapsed.as_micros() as u64);

        info!(
            batch_id = %batch_id,
            stores = %store_count,
            scored = %report.scored().count(),
            dropped = %report.dropped().count(),
            county_lookups = %report.county_lookups,
            county_cache_hits = %report.county_cache_hits,
            elapsed_ms = %elapsed.as_millis(),
            "batch_completed"
        );

        report
    }

    /// Record metrics and logs for one store and wrap its outcome
    fn settle(
        &self,
        batch_id: Uuid,
        store_id: StoreId,
        result: Result<EnrichedStore, DropReason>,
    ) -> StoreOutcome {
        match result {
            Ok(enriched) => {
                self.metrics.record_scored();
                StoreOutcome::Scored(enriched)
            }
            Err(reason) => {
                self.metrics.record_dropped(&reason);
                warn!(
                    batch_id = %batch_id,
                    store_id = %store_id,
                    reason = %reason.as_str(),
                    detail = %reason,
                    "store_dropped"
                );
                StoreOutcome::Dropped { store_id, reason }
            }
        }
    }
}
