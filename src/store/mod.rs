//! Read access to persisted training records
//!
//! The engine only ever reads. `WorkoutStore` is the seam to whatever owns
//! the rows; `load_snapshots` turns flat rows into hydrated workouts with a
//! fixed number of batch fetches.

pub mod sqlite;

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Exercise, ExerciseEntry, ExerciseSet, User, Workout, WorkoutExercise, WorkoutSnapshot};

pub use sqlite::SqliteStore;

#[async_trait]
pub trait WorkoutStore: Send + Sync {
  async fn workout(&self, id: i64) -> Result<Option<Workout>>;

  /// Workouts of a user dated within `[start, end]`, oldest first
  async fn workouts_in_range(&self, user_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Workout>>;

  /// Most recent workouts since `since` that include the exercise, newest first
  async fn recent_workouts_with_exercise(
    &self,
    user_id: i64,
    exercise_id: i64,
    since: DateTime<Utc>,
    limit: u32,
  ) -> Result<Vec<Workout>>;

  async fn workout_exercises(&self, workout_ids: &[i64]) -> Result<Vec<WorkoutExercise>>;

  async fn exercise_sets(&self, workout_exercise_ids: &[i64]) -> Result<Vec<ExerciseSet>>;

  async fn exercises(&self, ids: &[i64]) -> Result<Vec<Exercise>>;

  /// Catalog lookup by exact name
  async fn exercises_by_name(&self, names: &[&str]) -> Result<Vec<Exercise>>;

  async fn user(&self, id: i64) -> Result<Option<User>>;
}

/// Hydrate workouts with their exercises, sets and catalog metadata.
///
/// Issues three store calls no matter how many workouts are passed in.
/// Output keeps the input workout order.
pub async fn load_snapshots<S>(store: &S, workouts: Vec<Workout>) -> Result<Vec<WorkoutSnapshot>>
where
  S: WorkoutStore + ?Sized,
{
  if workouts.is_empty() {
    return Ok(Vec::new());
  }

  let workout_ids: Vec<i64> = workouts.iter().map(|w| w.id).collect();
  let slots = store.workout_exercises(&workout_ids).await?;

  let slot_ids: Vec<i64> = slots.iter().map(|s| s.id).collect();
  let exercise_ids: Vec<i64> = slots
    .iter()
    .map(|s| s.exercise_id)
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();

  let sets = store.exercise_sets(&slot_ids).await?;
  let catalog: HashMap<i64, Exercise> = store
    .exercises(&exercise_ids)
    .await?
    .into_iter()
    .map(|e| (e.id, e))
    .collect();

  let mut sets_by_slot: HashMap<i64, Vec<ExerciseSet>> = HashMap::new();
  for set in sets {
    sets_by_slot.entry(set.workout_exercise_id).or_default().push(set);
  }

  let mut slots_by_workout: HashMap<i64, Vec<WorkoutExercise>> = HashMap::new();
  for slot in slots {
    slots_by_workout.entry(slot.workout_id).or_default().push(slot);
  }

  let snapshots = workouts
    .into_iter()
    .map(|workout| {
      let mut slots = slots_by_workout.remove(&workout.id).unwrap_or_default();
      slots.sort_by_key(|s| (s.position, s.id));

      let exercises = slots
        .iter()
        .map(|slot| {
          let mut sets = sets_by_slot.remove(&slot.id).unwrap_or_default();
          sets.sort_by_key(|s| (s.set_number, s.id));
          ExerciseEntry::resolve(slot, catalog.get(&slot.exercise_id), sets)
        })
        .collect();

      WorkoutSnapshot { workout, exercises }
    })
    .collect();

  Ok(snapshots)
}
