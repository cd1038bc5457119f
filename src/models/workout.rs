use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
  pub id: i64,
  pub user_id: i64,
  pub name: String,
  pub date: DateTime<Utc>,
}

/// One exercise slot inside a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
  pub id: i64,
  pub workout_id: i64,
  pub exercise_id: i64,
  pub position: i64,
}

/// A logged set. Numeric fields are kept as loaded (number, text or null)
/// and are only read through `analysis::numeric`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
  pub id: i64,
  pub workout_exercise_id: i64,
  pub set_number: i64,
  pub weight_kg: Value,
  pub reps: Value,
  pub rir: Value,
  pub rpe: Value,
}
