//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Seed helpers for the training tables
//! - Mock record factories
//! - Helper assertions

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::models::{Exercise, ExerciseEntry, ExerciseSet, Workout, WorkoutExercise, WorkoutSnapshot};
use crate::store::sqlite::to_db_timestamp;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

pub fn datetime_now() -> DateTime<Utc> {
  Utc::now()
}

pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Seed Helpers
/// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &SqlitePool, email: &str) -> i64 {
  sqlx::query("INSERT INTO users (email) VALUES (?1)")
    .bind(email)
    .execute(pool)
    .await
    .expect("Failed to seed user")
    .last_insert_rowid()
}

/// Seed a catalog exercise; `coefficients` is stored as given (JSON text)
pub async fn seed_exercise(pool: &SqlitePool, name: &str, coefficients: Option<&str>) -> i64 {
  sqlx::query("INSERT INTO exercises (name, muscle_coefficients) VALUES (?1, ?2)")
    .bind(name)
    .bind(coefficients)
    .execute(pool)
    .await
    .expect("Failed to seed exercise")
    .last_insert_rowid()
}

pub async fn seed_workout(pool: &SqlitePool, user_id: i64, date: DateTime<Utc>) -> i64 {
  sqlx::query("INSERT INTO workouts (user_id, name, date) VALUES (?1, ?2, ?3)")
    .bind(user_id)
    .bind("Test Workout")
    .bind(to_db_timestamp(date))
    .execute(pool)
    .await
    .expect("Failed to seed workout")
    .last_insert_rowid()
}

pub async fn seed_workout_exercise(pool: &SqlitePool, workout_id: i64, exercise_id: i64, position: i64) -> i64 {
  sqlx::query("INSERT INTO workout_exercises (workout_id, exercise_id, position) VALUES (?1, ?2, ?3)")
    .bind(workout_id)
    .bind(exercise_id)
    .bind(position)
    .execute(pool)
    .await
    .expect("Failed to seed workout exercise")
    .last_insert_rowid()
}

pub async fn seed_set(
  pool: &SqlitePool,
  workout_exercise_id: i64,
  set_number: i64,
  weight_kg: Option<f64>,
  reps: Option<i64>,
) -> i64 {
  sqlx::query(
    r#"
    INSERT INTO exercise_sets (workout_exercise_id, set_number, weight_kg, reps)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(workout_exercise_id)
  .bind(set_number)
  .bind(weight_kg)
  .bind(reps)
  .execute(pool)
  .await
  .expect("Failed to seed set")
  .last_insert_rowid()
}

/// Seed a set whose weight and reps are free text, as older clients wrote them
pub async fn seed_text_set(pool: &SqlitePool, workout_exercise_id: i64, set_number: i64, weight: &str, reps: &str) -> i64 {
  sqlx::query(
    r#"
    INSERT INTO exercise_sets (workout_exercise_id, set_number, weight_kg, reps)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(workout_exercise_id)
  .bind(set_number)
  .bind(weight)
  .bind(reps)
  .execute(pool)
  .await
  .expect("Failed to seed text set")
  .last_insert_rowid()
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_set(set_number: i64, weight_kg: Option<f64>, reps: Option<i64>) -> ExerciseSet {
  ExerciseSet {
    id: set_number,
    workout_exercise_id: 0,
    set_number,
    weight_kg: weight_kg.map_or(Value::Null, |w| json!(w)),
    reps: reps.map_or(Value::Null, |r| json!(r)),
    rir: Value::Null,
    rpe: Value::Null,
  }
}

pub fn mock_text_set(set_number: i64, weight_kg: &str, reps: &str) -> ExerciseSet {
  ExerciseSet {
    weight_kg: json!(weight_kg),
    reps: json!(reps),
    ..mock_set(set_number, None, None)
  }
}

pub fn mock_exercise(id: i64, name: &str, muscle_coefficients: Value) -> Exercise {
  Exercise {
    id,
    name: name.to_string(),
    muscle_coefficients,
  }
}

/// Entry resolved against a catalog record built from `coefficients`
pub fn mock_entry(exercise_id: i64, name: &str, coefficients: Value, sets: Vec<ExerciseSet>) -> ExerciseEntry {
  let slot = WorkoutExercise {
    id: exercise_id,
    workout_id: 0,
    exercise_id,
    position: 0,
  };
  ExerciseEntry::resolve(&slot, Some(&mock_exercise(exercise_id, name, coefficients)), sets)
}

pub fn mock_snapshot(id: i64, days_ago: i64, exercises: Vec<ExerciseEntry>) -> WorkoutSnapshot {
  mock_snapshot_at(id, datetime_days_ago(days_ago), exercises)
}

/// Snapshot at a fixed date; entry positions follow vector order
pub fn mock_snapshot_at(id: i64, date: DateTime<Utc>, exercises: Vec<ExerciseEntry>) -> WorkoutSnapshot {
  let exercises = exercises
    .into_iter()
    .enumerate()
    .map(|(position, entry)| ExerciseEntry {
      position: position as i64,
      ..entry
    })
    .collect();

  WorkoutSnapshot {
    workout: Workout {
      id,
      user_id: 1,
      name: format!("Workout {}", id),
      date,
    },
    exercises,
  }
}

/// ---------------------------------------------------------------------------
/// Assertion Helpers
/// ---------------------------------------------------------------------------

/// Assert that two f64 values are approximately equal within tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {{
    let (left, right): (f64, f64) = ($left, $right);
    let diff = (left - right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      left,
      right,
      diff,
      $tolerance
    );
  }};
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    // Verify key tables exist
    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('users', 'exercises', 'workouts', 'workout_exercises', 'exercise_sets', 'analytics_snapshots')",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 6, "Expected 6 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_helpers_link_rows() {
    let pool = setup_test_db().await;

    let user_id = seed_user(&pool, "seed@example.com").await;
    let exercise_id = seed_exercise(&pool, "Squat", None).await;
    let workout_id = seed_workout(&pool, user_id, datetime_days_ago(2)).await;
    let slot = seed_workout_exercise(&pool, workout_id, exercise_id, 0).await;
    seed_set(&pool, slot, 1, Some(100.0), Some(5)).await;
    seed_set(&pool, slot, 2, Some(100.0), Some(5)).await;

    let count: i64 = sqlx::query_scalar(
      r#"
      SELECT COUNT(*)
      FROM exercise_sets s
      JOIN workout_exercises we ON we.id = s.workout_exercise_id
      JOIN workouts w ON w.id = we.workout_id
      WHERE w.user_id = ?1
      "#,
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await
    .expect("Failed to count sets");

    assert_eq!(count, 2);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let set = mock_set(3, Some(80.0), None);
    assert_eq!(set.weight_kg, json!(80.0));
    assert_eq!(set.reps, Value::Null);

    let snapshot = mock_snapshot_at(
      9,
      datetime_now(),
      vec![
        mock_entry(1, "Squat", Value::Null, vec![]),
        mock_entry(2, "Row", Value::Null, vec![]),
      ],
    );
    assert_eq!(snapshot.id(), 9);
    assert_eq!(snapshot.exercises[1].position, 1);
    assert!(snapshot.exercises[0].coefficients.is_fallback());
  }
}
