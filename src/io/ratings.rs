//! Check-in rating source
//!
//! `RatingSource::fetch` returns a store's ratings ordered by submission time.
//! An empty sequence means "no data" and is never an error.
//!
//! `MemoryRatingSource` keeps every store's ratings in memory. It can be filled
//! directly or loaded from a JSONL file with one rating per line:
//!
//! `{"store_id":"...","busy":7,"line":3,"hygiene":8,"mask":9,"submitted_at":"2020-07-06T15:00:00Z"}`

use crate::domain::types::{RatingRecord, StoreId};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[async_trait]
pub trait RatingSource: Send + Sync {
    /// All ratings for a store, ordered by `submitted_at`
    async fn fetch(&self, store_id: &StoreId) -> Vec<RatingRecord>;
}

#[derive(Debug, Deserialize)]
struct RatingLine {
    store_id: StoreId,
    #[serde(flatten)]
    record: RatingRecord,
}

/// In-memory ratings keyed by store
#[derive(Debug, Clone, Default)]
pub struct MemoryRatingSource {
    by_store: HashMap<StoreId, Vec<RatingRecord>>,
}

impl MemoryRatingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add ratings for a store, keeping its sequence time-ordered
    pub fn insert(&mut self, store_id: StoreId, records: impl IntoIterator<Item = RatingRecord>) {
        let entry = self.by_store.entry(store_id).or_default();
        entry.extend(records);
        // Stable: equal timestamps keep insertion order
        entry.sort_by_key(|r| r.submitted_at);
    }

    /// Parse JSONL content; malformed lines are skipped with a warning
    pub fn from_jsonl(content: &str) -> Self {
        let mut grouped: HashMap<StoreId, Vec<RatingRecord>> = HashMap::new();
        let mut skipped = 0usize;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<RatingLine>(line) {
                Ok(parsed) => grouped.entry(parsed.store_id).or_default().push(parsed.record),
                Err(e) => {
                    skipped += 1;
                    warn!(line = %(line_no + 1), error = %e, "rating_line_skipped");
                }
            }
        }

        let mut source = Self::new();
        for (store_id, records) in grouped {
            source.insert(store_id, records);
        }

        info!(stores = %source.store_count(), skipped = %skipped, "ratings_loaded");
        source
    }

    /// Load a JSONL ratings file
    pub fn load_jsonl<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ratings file {}", path.display()))?;
        Ok(Self::from_jsonl(&content))
    }

    pub fn store_count(&self) -> usize {
        self.by_store.len()
    }
}

#[async_trait]
impl RatingSource for MemoryRatingSource {
    async fn fetch(&self, store_id: &StoreId) -> Vec<RatingRecord> {
        self.by_store.get(store_id).cloned().unwrap_or_default()
    }
}
