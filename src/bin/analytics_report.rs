//! Operator CLI: print analytics reports as JSON

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use workout_analytics::config::AnalyticsConfig;
use workout_analytics::db::initialize_db;
use workout_analytics::error::Result;
use workout_analytics::service::AnalyticsService;
use workout_analytics::store::SqliteStore;

#[derive(Parser)]
#[command(name = "analytics-report")]
#[command(about = "Compute workout analytics from the training database")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Analytics for a single workout
  Workout {
    /// Workout id
    id: i64,
  },
  /// Progress report over a trailing window
  Progress {
    user_id: i64,

    /// Window length in days (default: ANALYTICS_WINDOW_DAYS or 30)
    #[arg(long)]
    days: Option<u32>,
  },
  /// Estimated one-rep-max for the tracked lifts
  Strength {
    user_id: i64,

    #[arg(long)]
    days: Option<u32>,
  },
  /// Compute the 30-day report and store it in analytics_snapshots
  Snapshot {
    user_id: i64,

    /// Free-form label stored with the snapshot
    #[arg(long)]
    tag: Option<String>,
  },
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  let config = match AnalyticsConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      eprintln!("{}", e);
      return ExitCode::FAILURE;
    }
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();

  match run(cli.command, &config).await {
    Ok(code) => code,
    Err(e) => {
      error!("{}", e);
      ExitCode::FAILURE
    }
  }
}

async fn run(command: Commands, config: &AnalyticsConfig) -> Result<ExitCode> {
  let pool = initialize_db(config).await?;
  let store = SqliteStore::new(pool);
  let service = AnalyticsService::new(store);

  match command {
    Commands::Workout { id } => match service.calculate_workout_analytics(id).await? {
      Some(report) => print_json(&report)?,
      None => {
        eprintln!("Workout {} not found", id);
        return Ok(ExitCode::FAILURE);
      }
    },
    Commands::Progress { user_id, days } => {
      let days = days.unwrap_or(config.default_window_days);
      print_json(&service.get_user_progress(user_id, days).await)?;
    }
    Commands::Strength { user_id, days } => {
      let days = days.unwrap_or(config.default_window_days);
      print_json(&service.strength_progress(user_id, days).await?)?;
    }
    Commands::Snapshot { user_id, tag } => {
      let report = service.create_analytics_snapshot(user_id).await;
      let snapshot_id = service.store().save_snapshot(user_id, &report, tag.as_deref()).await?;
      print_json(&serde_json::json!({ "snapshot_id": snapshot_id, "report": report }))?;
    }
  }

  Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
