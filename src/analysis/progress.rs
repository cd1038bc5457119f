//! Period progress aggregation
//!
//! Rolls every workout in a date window up into totals, weekly buckets,
//! per-exercise progress, muscle-group shares, a consistency score and
//! strength estimates. The output is always a structurally complete report;
//! failures upstream are folded into `ProgressReport::failed`.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::numeric::round_to;
use super::strength::{self, StrengthRecord};
use super::volume;
use crate::models::{Exercise, WorkoutSnapshot};

/// Muscle groups below this share (in percent) are left out of the distribution
pub const MIN_MUSCLE_SHARE_PCT: f64 = 0.1;

/// ---------------------------------------------------------------------------
/// Window
/// ---------------------------------------------------------------------------

/// Inclusive `[end - days, end]` range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressWindow {
  pub days: u32,
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl ProgressWindow {
  /// Windows reaching past the earliest representable instant start there
  pub fn ending_at(end: DateTime<Utc>, days: u32) -> Self {
    let start = Duration::try_days(i64::from(days))
      .and_then(|span| end.checked_sub_signed(span))
      .unwrap_or(DateTime::<Utc>::MIN_UTC);

    Self { days, start, end }
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    at >= self.start && at <= self.end
  }

  pub fn label(&self) -> String {
    format!("{} days", self.days)
  }
}

/// ---------------------------------------------------------------------------
/// Report Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
  pub period: String,
  pub total_workouts: usize,
  pub total_volume_kg: f64,
  pub avg_volume_per_workout: f64,
  pub weekly_progress: Vec<WeeklyProgress>,
  pub exercise_progress: BTreeMap<String, ExerciseProgress>,
  pub muscle_group_distribution: MuscleDistribution,
  pub consistency_score: f64,
  pub strength_progress: BTreeMap<String, StrengthRecord>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgress {
  /// ISO week key, e.g. "2025-W07"
  pub week: String,
  /// Monday of the ISO week
  pub week_start: NaiveDate,
  pub volume: f64,
  pub workouts: usize,
  pub avg_volume_per_workout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProgress {
  pub max_weight: f64,
  pub total_volume: f64,
  /// Workouts with at least one qualifying set of this exercise
  pub workouts: usize,
}

/// Percentage share per muscle group, largest first. Serializes as a JSON
/// object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MuscleDistribution(Vec<(String, f64)>);

impl MuscleDistribution {
  /// Convert absolute muscle volumes into percentage shares
  pub fn from_volumes(volumes: &BTreeMap<String, f64>) -> Self {
    let total: f64 = volumes.values().sum();
    if total <= 0.0 {
      return Self::default();
    }

    Self::sorted(
      volumes
        .iter()
        .map(|(muscle, v)| (muscle.clone(), v / total * 100.0))
        .filter(|(_, pct)| *pct >= MIN_MUSCLE_SHARE_PCT)
        .collect(),
    )
  }

  fn sorted(mut shares: Vec<(String, f64)>) -> Self {
    shares.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Self(shares)
  }

  pub fn get(&self, muscle: &str) -> Option<f64> {
    self.0.iter().find(|(m, _)| m == muscle).map(|(_, pct)| *pct)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
    self.0.iter().map(|(m, pct)| (m.as_str(), *pct))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn total(&self) -> f64 {
    self.0.iter().map(|(_, pct)| pct).sum()
  }
}

impl Serialize for MuscleDistribution {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.0.len()))?;
    for (muscle, pct) in &self.0 {
      map.serialize_entry(muscle, pct)?;
    }
    map.end()
  }
}

impl<'de> Deserialize<'de> for MuscleDistribution {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let shares = BTreeMap::<String, f64>::deserialize(deserializer)?;
    Ok(Self::sorted(shares.into_iter().collect()))
  }
}

impl ProgressReport {
  /// Report for a window with no workouts
  pub fn empty(window_days: u32) -> Self {
    Self {
      period: format!("{} days", window_days),
      total_workouts: 0,
      total_volume_kg: 0.0,
      avg_volume_per_workout: 0.0,
      weekly_progress: Vec::new(),
      exercise_progress: BTreeMap::new(),
      muscle_group_distribution: MuscleDistribution::default(),
      consistency_score: 0.0,
      strength_progress: BTreeMap::new(),
      error: None,
    }
  }

  /// Empty report annotated with the failure that prevented aggregation
  pub fn failed(window_days: u32, error: impl Into<String>) -> Self {
    Self {
      error: Some(error.into()),
      ..Self::empty(window_days)
    }
  }

  /// Aggregate hydrated workouts. Workouts outside the window are ignored;
  /// `tracked_lifts` are the catalog records used for strength progress.
  pub fn aggregate(window: &ProgressWindow, workouts: &[WorkoutSnapshot], tracked_lifts: &[Exercise]) -> Self {
    let in_window: Vec<WorkoutSnapshot> = workouts
      .iter()
      .filter(|w| window.contains(w.date()))
      .cloned()
      .collect();

    if in_window.is_empty() {
      return Self::empty(window.days);
    }

    let volumes: Vec<f64> = in_window.iter().map(volume::workout_volume).collect();
    let total_volume: f64 = volumes.iter().sum();
    let total_workouts = in_window.len();

    let dates: Vec<DateTime<Utc>> = in_window.iter().map(|w| w.date()).collect();

    Self {
      period: window.label(),
      total_workouts,
      total_volume_kg: total_volume,
      avg_volume_per_workout: total_volume / total_workouts as f64,
      weekly_progress: weekly_progress(&in_window, &volumes),
      exercise_progress: exercise_progress(&in_window),
      muscle_group_distribution: muscle_group_distribution(&in_window),
      consistency_score: consistency_score(&dates),
      strength_progress: strength::strength_progress(&in_window, tracked_lifts),
      error: None,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Aggregations
/// ---------------------------------------------------------------------------

/// Weekly volume buckets in chronological order. `volumes[i]` is the volume
/// of `workouts[i]`.
fn weekly_progress(workouts: &[WorkoutSnapshot], volumes: &[f64]) -> Vec<WeeklyProgress> {
  let mut buckets: BTreeMap<(i32, u32), (NaiveDate, f64, usize)> = BTreeMap::new();

  for (workout, volume) in workouts.iter().zip(volumes) {
    let day = workout.date().date_naive();
    let week = day.iso_week();
    let week_start = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    let bucket = buckets
      .entry((week.year(), week.week()))
      .or_insert((week_start, 0.0, 0));
    bucket.1 += volume;
    bucket.2 += 1;
  }

  buckets
    .into_iter()
    .map(|((year, week), (week_start, volume, count))| WeeklyProgress {
      week: format!("{}-W{:02}", year, week),
      week_start,
      volume,
      workouts: count,
      avg_volume_per_workout: if count > 0 { volume / count as f64 } else { 0.0 },
    })
    .collect()
}

/// Max weight, total volume and workout count per exercise name, over
/// qualifying sets only
fn exercise_progress(workouts: &[WorkoutSnapshot]) -> BTreeMap<String, ExerciseProgress> {
  let mut progress: BTreeMap<String, ExerciseProgress> = BTreeMap::new();
  let mut seen: HashSet<(String, i64)> = HashSet::new();

  for workout in workouts {
    for entry in &workout.exercises {
      for set in volume::qualifying_sets(entry) {
        let item = progress.entry(entry.name.clone()).or_insert(ExerciseProgress {
          max_weight: 0.0,
          total_volume: 0.0,
          workouts: 0,
        });
        item.max_weight = item.max_weight.max(set.weight_kg);
        item.total_volume += set.volume();
        if seen.insert((entry.name.clone(), workout.id())) {
          item.workouts += 1;
        }
      }
    }
  }

  progress
}

fn muscle_group_distribution(workouts: &[WorkoutSnapshot]) -> MuscleDistribution {
  let mut volumes = BTreeMap::new();
  for entry in workouts.iter().flat_map(|w| w.exercises.iter()) {
    entry.coefficients.attribute(volume::exercise_volume(entry), &mut volumes);
  }
  MuscleDistribution::from_volumes(&volumes)
}

/// Regularity of training gaps, 0..=100.
///
/// Gaps are whole days between consecutive workouts. The score drops with
/// the mean absolute deviation of the gaps relative to the mean gap. Fewer
/// than two workouts score 0; a mean gap of 0 (all on one day) scores 100.
pub fn consistency_score(dates: &[DateTime<Utc>]) -> f64 {
  if dates.len() < 2 {
    return 0.0;
  }

  let mut sorted = dates.to_vec();
  sorted.sort();

  let gaps: Vec<f64> = sorted
    .windows(2)
    .map(|pair| (pair[1] - pair[0]).num_days() as f64)
    .collect();
  let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;

  if mean_gap == 0.0 {
    return 100.0;
  }

  let mean_deviation = gaps.iter().map(|g| (g - mean_gap).abs()).sum::<f64>() / gaps.len() as f64;
  let score = (100.0 - (mean_deviation / mean_gap) * 100.0).clamp(0.0, 100.0);

  round_to(score, 1)
}
