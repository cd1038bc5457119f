//! Estimated one-rep-max for the tracked barbell lifts

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::numeric::round_to;
use super::volume;
use crate::models::{Exercise, WorkoutSnapshot};

/// Catalog names of the lifts reported in strength progress
pub const TRACKED_LIFTS: [&str; 4] = ["Bench Press", "Squat", "Deadlift", "Overhead Press"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthRecord {
  pub best_weight: f64,
  pub best_reps: i64,
  pub estimated_1rm: f64,
  pub date: DateTime<Utc>,
}

/// Estimate a one-rep-max as `weight * (1 + reps / 30)`, or the weight
/// itself for singles.
///
/// Linear estimator, not Brzycki or Epley. Stored and displayed history
/// depends on these exact numbers.
pub fn estimate_one_rep_max(weight: f64, reps: i64) -> f64 {
  if reps <= 1 {
    weight
  } else {
    weight * (1.0 + reps as f64 / 30.0)
  }
}

/// Best set per tracked lift across the given workouts.
///
/// `lifts` are the catalog records that matched `TRACKED_LIFTS`; a lift
/// missing from the catalog or without a qualifying set is left out. Ties on
/// weight keep the first set seen (workouts in date order, then exercise
/// position, then set number).
pub fn strength_progress(workouts: &[WorkoutSnapshot], lifts: &[Exercise]) -> BTreeMap<String, StrengthRecord> {
  let mut ordered: Vec<&WorkoutSnapshot> = workouts.iter().collect();
  ordered.sort_by_key(|w| (w.date(), w.id()));

  let mut progress = BTreeMap::new();

  for lift in lifts {
    let mut best: Option<(volume::QualifyingSet, DateTime<Utc>)> = None;

    for workout in &ordered {
      let sets = workout
        .exercises
        .iter()
        .filter(|entry| entry.exercise_id == lift.id)
        .flat_map(volume::qualifying_sets);

      for set in sets {
        let better = match &best {
          Some((current, _)) => set.weight_kg > current.weight_kg,
          None => true,
        };
        if better {
          best = Some((set, workout.date()));
        }
      }
    }

    if let Some((set, date)) = best {
      progress.insert(
        lift.name.clone(),
        StrengthRecord {
          best_weight: set.weight_kg,
          best_reps: set.reps,
          estimated_1rm: round_to(estimate_one_rep_max(set.weight_kg, set.reps), 2),
          date,
        },
      );
    }
  }

  progress
}
