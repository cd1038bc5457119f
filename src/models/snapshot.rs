//! Hydrated, read-only view of a workout as the engine consumes it

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Exercise, ExerciseSet, Workout, WorkoutExercise};
use crate::analysis::muscles::{MuscleCoefficients, UNKNOWN_MUSCLE};

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutSnapshot {
  pub workout: Workout,
  /// Ordered by position
  pub exercises: Vec<ExerciseEntry>,
}

impl WorkoutSnapshot {
  pub fn id(&self) -> i64 {
    self.workout.id
  }

  pub fn date(&self) -> DateTime<Utc> {
    self.workout.date
  }
}

/// A workout exercise joined with its catalog metadata and sets
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseEntry {
  pub workout_exercise_id: i64,
  pub exercise_id: i64,
  pub position: i64,
  pub name: String,
  pub coefficients: MuscleCoefficients,
  /// Ordered by set number
  pub sets: Vec<ExerciseSet>,
}

impl ExerciseEntry {
  /// Join a slot with its catalog record. A missing record becomes the
  /// "Unknown" placeholder with the fallback coefficient map.
  pub fn resolve(slot: &WorkoutExercise, exercise: Option<&Exercise>, sets: Vec<ExerciseSet>) -> Self {
    let (name, coefficients) = match exercise {
      Some(exercise) => (
        exercise.name.clone(),
        MuscleCoefficients::parse(&exercise.muscle_coefficients),
      ),
      None => (UNKNOWN_MUSCLE.to_string(), MuscleCoefficients::fallback()),
    };

    Self {
      workout_exercise_id: slot.id,
      exercise_id: slot.exercise_id,
      position: slot.position,
      name,
      coefficients,
      sets,
    }
  }
}
