//! Training volume (weight x reps) at set, exercise and workout level

use crate::models::{ExerciseEntry, ExerciseSet, WorkoutSnapshot};

use super::numeric;

/// A set with positive weight and positive reps. Anything else is inert:
/// it adds no volume and is left out of set and rep counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualifyingSet {
  pub set_number: i64,
  pub weight_kg: f64,
  pub reps: i64,
}

impl QualifyingSet {
  pub fn from_set(set: &ExerciseSet) -> Option<Self> {
    let weight_kg = numeric::coerce_f64(&set.weight_kg);
    let reps = numeric::coerce_i64(&set.reps);
    if weight_kg > 0.0 && reps > 0 {
      Some(Self {
        set_number: set.set_number,
        weight_kg,
        reps,
      })
    } else {
      None
    }
  }

  pub fn volume(&self) -> f64 {
    self.weight_kg * self.reps as f64
  }

  /// Heuristic load proxy used by the intensity score. Not RPE-based.
  pub fn intensity(&self) -> f64 {
    self.weight_kg * 0.4 + self.reps as f64 * 0.1
  }
}

pub fn set_volume(set: &ExerciseSet) -> f64 {
  QualifyingSet::from_set(set).map_or(0.0, |s| s.volume())
}

pub fn exercise_volume(entry: &ExerciseEntry) -> f64 {
  entry.sets.iter().map(set_volume).sum()
}

pub fn workout_volume(snapshot: &WorkoutSnapshot) -> f64 {
  snapshot.exercises.iter().map(exercise_volume).sum()
}

/// Iterate the qualifying sets of an exercise in stored order
pub fn qualifying_sets(entry: &ExerciseEntry) -> impl Iterator<Item = QualifyingSet> + '_ {
  entry.sets.iter().filter_map(QualifyingSet::from_set)
}
