//! Environment-driven configuration
//!
//! Values come from the process environment, with a `.env` file loaded
//! first if one exists.

use std::env;
use std::str::FromStr;

use crate::error::{AnalyticsError, Result};

/// ---------------------------------------------------------------------------
/// Defaults
/// ---------------------------------------------------------------------------

pub const DEFAULT_DATABASE_URL: &str = "sqlite://workout-analytics.db?mode=rwc";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_LOG_FILTER: &str = "workout_analytics=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
  pub database_url: String,
  pub max_connections: u32,
  /// Progress window used when a caller does not pick one
  pub default_window_days: u32,
  /// Tracing filter used when RUST_LOG is not set
  pub log_filter: String,
}

impl Default for AnalyticsConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      max_connections: DEFAULT_MAX_CONNECTIONS,
      default_window_days: DEFAULT_WINDOW_DAYS,
      log_filter: DEFAULT_LOG_FILTER.to_string(),
    }
  }
}

impl AnalyticsConfig {
  /// Load configuration, reading `.env` first
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();
    Self::from_process_env()
  }

  /// Load configuration from the current process environment only
  pub fn from_process_env() -> Result<Self> {
    let defaults = Self::default();

    Ok(Self {
      database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
      max_connections: parse_var("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
      default_window_days: parse_var("ANALYTICS_WINDOW_DAYS", defaults.default_window_days)?,
      log_filter: env::var("ANALYTICS_LOG").unwrap_or(defaults.log_filter),
    })
  }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
  match env::var(name) {
    Ok(raw) => raw
      .trim()
      .parse()
      .map_err(|_| AnalyticsError::Config(format!("{} must be a non-negative integer, got {:?}", name, raw))),
    Err(_) => Ok(default),
  }
}
