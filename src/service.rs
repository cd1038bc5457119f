//! Public analytics operations over an injected store
//!
//! Each call fetches what it needs through `WorkoutStore`, then hands the
//! hydrated workouts to the pure `analysis` layer. The service holds no
//! state of its own beyond the store handle.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use crate::analysis::{ProgressReport, ProgressWindow, StrengthRecord, WorkoutAnalytics, TRACKED_LIFTS};
use crate::error::Result;
use crate::recommendation::{
  build_history, interpret_reply, CurrentSet, ExerciseInfo, Recommendation, RecommendationRequest, Recommender,
  UserProfile, HISTORY_DAYS, HISTORY_WORKOUTS,
};
use crate::store::{load_snapshots, WorkoutStore};

/// Window used by `create_analytics_snapshot`
pub const SNAPSHOT_WINDOW_DAYS: u32 = 30;

pub struct AnalyticsService<S> {
  store: S,
}

impl<S: WorkoutStore> AnalyticsService<S> {
  pub fn new(store: S) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  /// ---------------------------------------------------------------------------
  /// Workout Analytics
  /// ---------------------------------------------------------------------------

  /// Report for one workout, or `None` if the id does not resolve.
  /// Store failures are returned as errors.
  pub async fn calculate_workout_analytics(&self, workout_id: i64) -> Result<Option<WorkoutAnalytics>> {
    debug!(workout_id, "Calculating workout analytics");

    let Some(workout) = self.store.workout(workout_id).await? else {
      info!(workout_id, "Workout not found");
      return Ok(None);
    };

    let snapshots = load_snapshots(&self.store, vec![workout]).await?;
    Ok(snapshots.first().map(WorkoutAnalytics::build))
  }

  /// ---------------------------------------------------------------------------
  /// Period Progress
  /// ---------------------------------------------------------------------------

  /// Progress over the last `window_days` days. Never fails: any error is
  /// logged and reported through the `error` field of an empty report.
  pub async fn get_user_progress(&self, user_id: i64, window_days: u32) -> ProgressReport {
    self.user_progress_at(user_id, window_days, Utc::now()).await
  }

  /// `get_user_progress` with an explicit end of window
  pub async fn user_progress_at(&self, user_id: i64, window_days: u32, now: DateTime<Utc>) -> ProgressReport {
    let window = ProgressWindow::ending_at(now, window_days);

    match self.aggregate_window(user_id, &window).await {
      Ok(report) => {
        info!(
          user_id,
          window_days,
          workouts = report.total_workouts,
          "Aggregated user progress"
        );
        report
      }
      Err(e) => {
        error!(user_id, window_days, "Progress aggregation failed: {}", e);
        ProgressReport::failed(window_days, e.to_string())
      }
    }
  }

  /// Progress for the default snapshot window, for callers that persist it
  pub async fn create_analytics_snapshot(&self, user_id: i64) -> ProgressReport {
    self.get_user_progress(user_id, SNAPSHOT_WINDOW_DAYS).await
  }

  /// Strength section of the progress report on its own
  pub async fn strength_progress(&self, user_id: i64, window_days: u32) -> Result<BTreeMap<String, StrengthRecord>> {
    let window = ProgressWindow::ending_at(Utc::now(), window_days);
    let report = self.aggregate_window(user_id, &window).await?;
    Ok(report.strength_progress)
  }

  async fn aggregate_window(&self, user_id: i64, window: &ProgressWindow) -> Result<ProgressReport> {
    let workouts = self.store.workouts_in_range(user_id, window.start, window.end).await?;
    debug!(user_id, count = workouts.len(), "Workouts in window");

    if workouts.is_empty() {
      return Ok(ProgressReport::empty(window.days));
    }

    let snapshots = load_snapshots(&self.store, workouts).await?;
    let lifts = self.store.exercises_by_name(&TRACKED_LIFTS).await?;

    Ok(ProgressReport::aggregate(window, &snapshots, &lifts))
  }

  /// ---------------------------------------------------------------------------
  /// Recommendations
  /// ---------------------------------------------------------------------------

  /// Ask the recommender for the next sets of an exercise. Never fails;
  /// problems come back as `Recommendation::Unavailable`.
  pub async fn exercise_recommendation(
    &self,
    user_id: i64,
    exercise_id: i64,
    current_sets: Vec<CurrentSet>,
    recommender: &dyn Recommender,
  ) -> Recommendation {
    info!(user_id, exercise_id, "Requesting exercise recommendation");

    let request = match self.recommendation_request(user_id, exercise_id, current_sets).await {
      Ok(Some(request)) => request,
      Ok(None) => {
        warn!(user_id, "User not found");
        return Recommendation::unavailable(format!("User {} not found", user_id));
      }
      Err(e) => {
        error!(user_id, exercise_id, "Failed to assemble recommendation request: {}", e);
        return Recommendation::unavailable(e.to_string());
      }
    };

    if request.lacks_data() {
      info!(user_id, exercise_id, "No history or current sets to recommend from");
      return Recommendation::requires_initial_set();
    }

    let reply = match recommender.recommend(&request).await {
      Ok(reply) => reply,
      Err(e) => {
        error!(user_id, exercise_id, "Recommender failed: {}", e);
        return Recommendation::unavailable(e.to_string());
      }
    };

    interpret_reply(&reply, &request.exercise_info.name, request.current_sets.len())
  }

  async fn recommendation_request(
    &self,
    user_id: i64,
    exercise_id: i64,
    current_sets: Vec<CurrentSet>,
  ) -> Result<Option<RecommendationRequest>> {
    let Some(user) = self.store.user(user_id).await? else {
      return Ok(None);
    };

    let since = Utc::now() - Duration::days(HISTORY_DAYS);
    let workouts = self
      .store
      .recent_workouts_with_exercise(user_id, exercise_id, since, HISTORY_WORKOUTS)
      .await?;
    let snapshots = load_snapshots(&self.store, workouts).await?;

    let exercise = self.store.exercises(&[exercise_id]).await?.into_iter().next();

    Ok(Some(RecommendationRequest {
      user_profile: UserProfile::new(user.training_goal.as_deref()),
      exercise_info: ExerciseInfo::describe(exercise_id, exercise.as_ref()),
      recent_workouts: build_history(&snapshots, exercise_id),
      current_sets,
    }))
  }
}
