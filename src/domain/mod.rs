//! Domain models - stores, check-ins, counties and scores
//!
//! - `types` - Store, RatingRecord, CountyIdentity, EnrichedStore, BatchResult
//! - `check_in` - Composite score and daily running-average aggregation

pub mod check_in;
pub mod types;

pub use check_in::{CheckInAggregator, CheckInStats, DayBoundary, ScoreWeights};
pub use types::{
    BatchResult, Category, CompositeScore, CountyIdentity, DailyBucket, DailySeries,
    EnrichedStore, LatLng, RatingRecord, Store, StoreId, StoresResponse, NEUTRAL_SCORE,
};
