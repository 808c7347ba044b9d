pub mod cache;
pub mod calculator;
pub mod config;
pub mod validation;

pub use cache::{CacheStats, ScoreCache, ScoreKey};
pub use calculator::{calculate_score, ScoreClass};
pub use config::{Rounding, ScoringConfig};
pub use validation::validate_catalog;
