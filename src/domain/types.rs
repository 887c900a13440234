//! Shared types for the scoring engine

use crate::domain::check_in::CheckInStats;
use crate::error::LocationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Score substituted when there is no data to average (0-10 scale)
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Newtype wrapper for store (place) IDs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub String);

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoreId {
    fn from(id: &str) -> Self {
        StoreId(id.to_string())
    }
}

/// A coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Parses `"lat,lng"`
impl std::str::FromStr for LatLng {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(LocationError::Empty);
        }

        let parts: Vec<&str> = s.split(',').collect();
        let [lat, lng] = parts.as_slice() else {
            return Err(LocationError::WrongFormat(s.to_string()));
        };

        match (lat.trim().parse::<f64>(), lng.trim().parse::<f64>()) {
            (Ok(latitude), Ok(longitude)) => Ok(Self { latitude, longitude }),
            _ => Err(LocationError::NotNumeric(s.to_string())),
        }
    }
}

/// A store found near the user's location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    /// Unknown when the listing carries no opening hours
    pub open_now: Option<bool>,
    pub location: LatLng,
    /// Listing rating, 0 when absent
    pub rating: f64,
}

/// Rating category of a check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Busy,
    Line,
    Hygiene,
    Mask,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Busy, Category::Line, Category::Hygiene, Category::Mask];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Busy => "busy",
            Category::Line => "line",
            Category::Hygiene => "hygiene",
            Category::Mask => "mask",
        }
    }
}

/// One crowd-submitted check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub busy: f64,
    pub line: f64,
    pub hygiene: f64,
    pub mask: f64,
    pub submitted_at: DateTime<Utc>,
}

impl RatingRecord {
    #[inline]
    pub fn value(&self, category: Category) -> f64 {
        match category {
            Category::Busy => self.busy,
            Category::Line => self.line,
            Category::Hygiene => self.hygiene,
            Category::Mask => self.mask,
        }
    }

    #[inline]
    pub fn day(&self) -> NaiveDate {
        self.submitted_at.date_naive()
    }
}

/// County a coordinate falls in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyIdentity {
    pub name: String,
    pub state: String,
    pub fips: String,
}

impl std::fmt::Display for CountyIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} ({})", self.name, self.state, self.fips)
    }
}

/// Averaged check-in ratings for one store
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeScore {
    pub busy: f64,
    pub line: f64,
    pub hygiene: f64,
    pub mask: f64,
    pub check_in_count: u64,
}

impl CompositeScore {
    /// Placeholder used when a store has no check-ins
    pub fn neutral() -> Self {
        Self {
            busy: NEUTRAL_SCORE,
            line: NEUTRAL_SCORE,
            hygiene: NEUTRAL_SCORE,
            mask: NEUTRAL_SCORE,
            check_in_count: 0,
        }
    }

    pub fn value(&self, category: Category) -> f64 {
        match category {
            Category::Busy => self.busy,
            Category::Line => self.line,
            Category::Hygiene => self.hygiene,
            Category::Mask => self.mask,
        }
    }
}

/// Running-average data point emitted at a day boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub category: Category,
    pub value: f64,
    pub day: NaiveDate,
}

/// Per-category ordered bucket sequences
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailySeries {
    pub busy: Vec<DailyBucket>,
    pub line: Vec<DailyBucket>,
    pub hygiene: Vec<DailyBucket>,
    pub mask: Vec<DailyBucket>,
}

impl DailySeries {
    pub fn get(&self, category: Category) -> &[DailyBucket] {
        match category {
            Category::Busy => &self.busy,
            Category::Line => &self.line,
            Category::Hygiene => &self.hygiene,
            Category::Mask => &self.mask,
        }
    }

    pub(crate) fn get_mut(&mut self, category: Category) -> &mut Vec<DailyBucket> {
        match category {
            Category::Busy => &mut self.busy,
            Category::Line => &mut self.line,
            Category::Hygiene => &mut self.hygiene,
            Category::Mask => &mut self.mask,
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_empty())
    }
}

/// A store with its county severity and check-in statistics attached.
///
/// Only ever built from fully resolved inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedStore {
    pub store: Store,
    pub county: CountyIdentity,
    pub county_score: f64,
    pub check_ins: CompositeScore,
    pub check_in_score: f64,
    /// Blend of county and check-in scores
    pub score: f64,
    pub daily: DailySeries,
}

impl EnrichedStore {
    pub fn new(
        store: Store,
        county: CountyIdentity,
        county_score: f64,
        stats: CheckInStats,
        county_weight: f64,
    ) -> Self {
        let score = county_weight * county_score + (1.0 - county_weight) * stats.score;
        Self {
            store,
            county,
            county_score,
            check_ins: stats.composite,
            check_in_score: stats.score,
            score,
            daily: stats.daily,
        }
    }
}

/// Stores that scored successfully, in no guaranteed order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchResult {
    stores: Vec<EnrichedStore>,
}

impl BatchResult {
    pub fn new(stores: Vec<EnrichedStore>) -> Self {
        Self { stores }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnrichedStore> {
        self.stores.iter()
    }

    pub fn get(&self, id: &StoreId) -> Option<&EnrichedStore> {
        self.stores.iter().find(|s| &s.store.id == id)
    }

    pub fn into_stores(self) -> Vec<EnrichedStore> {
        self.stores
    }
}

/// Response body handed back to the caller
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoresResponse {
    pub stores: BatchResult,
    pub user_location: LatLng,
}
