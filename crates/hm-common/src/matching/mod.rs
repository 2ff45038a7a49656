pub mod environment;
pub mod ranking;
pub mod scoring;
pub mod weights;

pub use ranking::{RankedTask, RankedUser, DEFAULT_RECOMMENDATION_LIMIT};
pub use scoring::{MatchEngine, MatchResult, MatchingConfig, ScoreBreakdown, ALL_DAY_SLOT};
pub use weights::{Weights, DEFAULT_WEIGHTS};
