use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::AnalyticsConfig;
use crate::error::Result;

pub type DbPool = SqlitePool;

/// Open the connection pool and run migrations
pub async fn initialize_db(config: &AnalyticsConfig) -> Result<DbPool> {
  info!("Initializing database at: {}", config.database_url);

  let pool = SqlitePoolOptions::new()
    .max_connections(config.max_connections.max(1))
    .connect(&config.database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}
