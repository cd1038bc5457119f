//! Training analytics engine
//!
//! Turns logged strength-training records into per-workout reports and
//! per-period progress (volume trends, muscle-group distribution,
//! consistency, estimated one-rep-max), plus the plumbing around an
//! external load recommender.

pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod recommendation;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_utils;

pub use analysis::{ProgressReport, StrengthRecord, WorkoutAnalytics};
pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, Result};
pub use recommendation::{Recommendation, Recommender};
pub use service::AnalyticsService;
pub use store::{SqliteStore, WorkoutStore};
