//! IO modules - external collaborators
//!
//! - `county` - County resolution interface
//! - `fcc` - FCC Census Area API resolver backed by percentile tables
//! - `percentile` - County percentile CSV tables
//! - `ratings` - Check-in rating source (in-memory, JSONL loader)
//! - `places` - Store discovery document parsing

pub mod county;
pub mod fcc;
pub mod percentile;
pub mod places;
pub mod ratings;

pub use county::CountyResolver;
pub use fcc::FccCountyResolver;
pub use percentile::{PercentileTable, PercentileTables};
pub use places::{load_places, parse_places};
pub use ratings::{MemoryRatingSource, RatingSource};
