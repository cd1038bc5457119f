//! Per-workout analytics report

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::muscles::MuscleCoefficients;
use super::numeric::{self, round_to};
use super::volume::{self, QualifyingSet};
use crate::models::{ExerciseEntry, WorkoutSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutAnalytics {
  pub workout_id: i64,
  pub date: DateTime<Utc>,
  pub total_volume: f64,
  /// Qualifying sets only
  pub total_sets: usize,
  /// Reps summed over qualifying sets only, saturating at `i64::MAX`
  pub total_reps: i64,
  pub exercises: Vec<ExerciseBreakdown>,
  /// Absolute volume attributed to each muscle group (not percentages)
  pub muscle_group_volume: BTreeMap<String, f64>,
  /// Volume-weighted mean of `weight * 0.4 + reps * 0.1` per set
  pub intensity_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseBreakdown {
  pub exercise_name: String,
  pub muscle_coefficients: MuscleCoefficients,
  pub sets: Vec<SetDetail>,
  pub volume: f64,
  pub max_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDetail {
  pub set_number: i64,
  pub weight: f64,
  pub reps: i64,
  pub volume: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rir: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rpe: Option<f64>,
}

impl WorkoutAnalytics {
  /// Build the report for one hydrated workout
  pub fn build(snapshot: &WorkoutSnapshot) -> Self {
    let mut exercises = Vec::with_capacity(snapshot.exercises.len());
    let mut muscle_group_volume = BTreeMap::new();
    let mut qualifying = Vec::new();

    for entry in &snapshot.exercises {
      let breakdown = ExerciseBreakdown::build(entry);
      entry.coefficients.attribute(breakdown.volume, &mut muscle_group_volume);
      qualifying.extend(volume::qualifying_sets(entry));
      exercises.push(breakdown);
    }

    let total_volume: f64 = exercises.iter().map(|e| e.volume).sum();
    let total_reps = qualifying.iter().fold(0i64, |total, s| total.saturating_add(s.reps));

    Self {
      workout_id: snapshot.id(),
      date: snapshot.date(),
      total_volume,
      total_sets: qualifying.len(),
      total_reps,
      exercises,
      muscle_group_volume: muscle_group_volume
        .into_iter()
        .map(|(muscle, v)| (muscle, round_to(v, 2)))
        .collect(),
      intensity_score: round_to(intensity_score(&qualifying), 2),
    }
  }
}

impl ExerciseBreakdown {
  fn build(entry: &ExerciseEntry) -> Self {
    let sets: Vec<SetDetail> = entry
      .sets
      .iter()
      .filter_map(|set| {
        QualifyingSet::from_set(set).map(|q| SetDetail {
          set_number: q.set_number,
          weight: q.weight_kg,
          reps: q.reps,
          volume: q.volume(),
          rir: numeric::try_f64(&set.rir),
          rpe: numeric::try_f64(&set.rpe),
        })
      })
      .collect();

    Self {
      exercise_name: entry.name.clone(),
      muscle_coefficients: entry.coefficients.clone(),
      volume: sets.iter().map(|s| s.volume).sum(),
      max_weight: sets.iter().map(|s| s.weight).fold(0.0, f64::max),
      sets,
    }
  }
}

/// Volume-weighted average of the per-set intensity proxy; 0 with no volume
pub fn intensity_score(sets: &[QualifyingSet]) -> f64 {
  let (weighted, total) = sets.iter().fold((0.0, 0.0), |(weighted, total), set| {
    let v = set.volume();
    (weighted + set.intensity() * v, total + v)
  });

  if total > 0.0 {
    weighted / total
  } else {
    0.0
  }
}
