pub mod config;
pub mod engine;
pub mod factors;
pub mod tbt;
pub mod validation;

pub use config::*;
pub use engine::{compute_leaderboard, Direction, LeaderboardEntry, LeaderboardMetrics};
pub use factors::{percent_change, Metric, MetricDelta};
pub use tbt::{score_tbt, TbtMetric, TbtSample};
pub use validation::validate_scoring;
