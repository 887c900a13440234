//! Services - batch scoring orchestration
//!
//! - `batch` - Fans stores out to concurrent scoring tasks and collects outcomes
//! - `store_scorer` - Scores one store (county, severity, check-ins)
//! - `county_cache` - Per-batch single-flight cache of county severity scores

pub mod batch;
pub mod county_cache;
pub mod store_scorer;

pub use batch::{BatchCoordinator, BatchReport, BatchSettings, StoreOutcome};
pub use county_cache::CountyScoreCache;
pub use store_scorer::StoreScorer;
