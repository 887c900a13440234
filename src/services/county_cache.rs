//! Per-batch county severity cache with single-flight lookups
//!
//! Each fips code gets one `OnceCell` slot. The map lock is held only to find
//! or create the slot; the lookup itself runs inside `get_or_try_init`, so
//! concurrent callers for the same fips wait on the first one and all observe
//! its value. At most one lookup per fips succeeds per cache.
//!
//! Failed lookups are not memoized.

use crate::error::ScoreError;
use crate::io::county::CountyResolver;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

pub struct CountyScoreCache {
    resolver: Arc<dyn CountyResolver>,
    slots: Mutex<FxHashMap<String, Arc<OnceCell<f64>>>>,
    /// Underlying severity lookups started
    lookups: AtomicU64,
    /// Resolves answered without starting a lookup
    hits: AtomicU64,
}

impl CountyScoreCache {
    pub fn new(resolver: Arc<dyn CountyResolver>) -> Self {
        Self {
            resolver,
            slots: Mutex::new(FxHashMap::default()),
            lookups: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Severity score for `fips`, looked up at most once
    pub async fn resolve(&self, fips: &str) -> Result<f64, ScoreError> {
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(fips.to_string()).or_default().clone()
        };

        let mut looked_up = false;
        let score = slot
            .get_or_try_init(|| {
                looked_up = true;
                self.lookups.fetch_add(1, Ordering::Relaxed);
                debug!(fips = %fips, "county_lookup");
                self.resolver.severity(fips)
            })
            .await?;

        if !looked_up {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(*score)
    }

    /// Cached score, if already resolved
    pub fn get(&self, fips: &str) -> Option<f64> {
        self.slots.lock().get(fips).and_then(|slot| slot.get().copied())
    }

    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}
