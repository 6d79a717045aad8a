//! Lighthouse/PSI leaderboards: rank sites by how their audit scores changed
//! between the previous and the latest run.

pub mod api;
pub mod audit;
pub mod config;
pub mod insights;
pub mod output;
pub mod scoring;
