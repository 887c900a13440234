//! County percentile tables
//!
//! CSV files with a `fips,percentile` header; columns are matched by header
//! name and any extra columns are ignored. Fips codes are compared
//! numerically, so `"06037"` and `"6037"` match. Severity is the percentile
//! scaled to 0-10.
//!
//! Lookup order: updated table, backup table, then `NEUTRAL_SCORE`.

use crate::domain::types::NEUTRAL_SCORE;
use anyhow::Context;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct PercentileRow {
    fips: String,
    percentile: f64,
}

/// Percentile (0-1) per numeric fips code
#[derive(Debug, Clone, Default)]
pub struct PercentileTable {
    percentiles: FxHashMap<u32, f64>,
}

impl PercentileTable {
    /// Parse CSV content. The first line is a header; malformed rows are skipped.
    pub fn parse(content: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut percentiles = FxHashMap::default();
        for (row_no, row) in reader.deserialize::<PercentileRow>().enumerate() {
            let parsed = row
                .ok()
                .and_then(|row| row.fips.parse::<u32>().ok().map(|fips| (fips, row.percentile)));

            match parsed {
                Some((fips, percentile)) => {
                    percentiles.insert(fips, percentile);
                }
                None => debug!(row = %(row_no + 1), "percentile_row_skipped"),
            }
        }

        Self { percentiles }
    }

    /// Load a table from disk
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read percentile table {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Severity (percentile * 10) for a fips code
    pub fn severity(&self, fips: u32) -> Option<f64> {
        self.percentiles.get(&fips).map(|p| p * 10.0)
    }

    pub fn len(&self) -> usize {
        self.percentiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.percentiles.is_empty()
    }
}

/// Updated table with a backup behind it
#[derive(Debug, Clone, Default)]
pub struct PercentileTables {
    primary: PercentileTable,
    backup: PercentileTable,
}

impl PercentileTables {
    pub fn new(primary: PercentileTable, backup: PercentileTable) -> Self {
        Self { primary, backup }
    }

    /// Load both tables; an unreadable file becomes an empty table
    pub fn load<P: AsRef<Path>, B: AsRef<Path>>(primary: P, backup: B) -> Self {
        let load_or_empty = |path: &Path, which: &str| match PercentileTable::load(path) {
            Ok(table) => {
                info!(table = %which, rows = %table.len(), path = %path.display(), "percentile_table_loaded");
                table
            }
            Err(e) => {
                warn!(table = %which, error = %e, "percentile_table_unavailable");
                PercentileTable::default()
            }
        };

        Self {
            primary: load_or_empty(primary.as_ref(), "primary"),
            backup: load_or_empty(backup.as_ref(), "backup"),
        }
    }

    /// Severity for a fips code, never failing
    pub fn severity(&self, fips: &str) -> f64 {
        let Ok(code) = fips.trim().parse::<u32>() else {
            warn!(fips = %fips, "county_fips_not_numeric");
            return NEUTRAL_SCORE;
        };

        if let Some(score) = self.primary.severity(code) {
            return score;
        }

        if let Some(score) = self.backup.severity(code) {
            info!(fips = %fips, "county_score_from_backup");
            return score;
        }

        warn!(fips = %fips, "county_score_unavailable");
        NEUTRAL_SCORE
    }
}
