//! Error types for the analytics engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Invalid stored record: {0}")]
  InvalidRecord(String),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Recommender error: {0}")]
  Recommender(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
