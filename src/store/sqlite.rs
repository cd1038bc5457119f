//! SQLite-backed `WorkoutStore`

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, TypeInfo, ValueRef};
use tracing::{debug, warn};

use super::WorkoutStore;
use crate::analysis::ProgressReport;
use crate::db::DbPool;
use crate::error::{AnalyticsError, Result};
use crate::models::{Exercise, ExerciseSet, User, Workout, WorkoutExercise};

/// Ids bound per `IN (...)` statement; SQLite builds before 3.32 cap a
/// statement at 999 parameters
const IN_LIST_CHUNK: usize = 500;

#[derive(Debug, Clone)]
pub struct SqliteStore {
  pool: DbPool,
}

impl SqliteStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &DbPool {
    &self.pool
  }

  /// Persist a progress report as JSON and return the snapshot row id
  pub async fn save_snapshot(&self, user_id: i64, report: &ProgressReport, tag: Option<&str>) -> Result<i64> {
    let payload = serde_json::to_string(report)?;

    let result = sqlx::query(
      r#"
      INSERT INTO analytics_snapshots (user_id, created_at, tag, payload_json)
      VALUES (?, ?, ?, ?)
      "#,
    )
    .bind(user_id)
    .bind(to_db_timestamp(Utc::now()))
    .bind(tag)
    .bind(payload)
    .execute(&self.pool)
    .await?;

    let id = result.last_insert_rowid();
    debug!(user_id, snapshot_id = id, "Saved analytics snapshot");
    Ok(id)
  }

  /// Run `{select}(ids){order_by}` once per chunk of ids and concatenate the rows
  async fn fetch_by_ids(&self, select: &str, ids: &[i64], order_by: &str) -> Result<Vec<SqliteRow>> {
    let mut rows = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(IN_LIST_CHUNK) {
      let mut builder = QueryBuilder::new(select);
      push_id_list(&mut builder, chunk);
      builder.push(order_by);
      rows.extend(builder.build().fetch_all(&self.pool).await?);
    }

    if ids.len() > IN_LIST_CHUNK {
      debug!(ids = ids.len(), chunk = IN_LIST_CHUNK, "Fetched id list in chunks");
    }
    Ok(rows)
  }
}

/// ---------------------------------------------------------------------------
/// Row Decoding
/// ---------------------------------------------------------------------------

/// Timestamp text as written to the `workouts.date` column
pub fn to_db_timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Range bound for `julianday` comparisons, clamped to the years it accepts
fn to_db_bound(at: DateTime<Utc>) -> String {
  match at.year() {
    year if year < 0 => "0000-01-01T00:00:00.000Z".to_string(),
    year if year > 9999 => "9999-12-31T23:59:59.999Z".to_string(),
    _ => to_db_timestamp(at),
  }
}

/// Parse a stored timestamp: RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a
/// bare date (midnight UTC)
pub fn parse_db_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| dt.with_timezone(&Utc))
    .ok()
    .or_else(|| {
      NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .ok()
    })
    .or_else(|| {
      NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
    })
}

/// Read a loosely typed column as integer, real, text or null
fn loose_value(row: &SqliteRow, column: &str) -> Result<Value> {
  let kind = {
    let raw = row.try_get_raw(column)?;
    if raw.is_null() {
      return Ok(Value::Null);
    }
    raw.type_info().name().to_string()
  };

  let value = match kind.as_str() {
    "INTEGER" | "BIGINT" | "INT8" | "BOOLEAN" => Value::from(row.try_get_unchecked::<i64, _>(column)?),
    "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => serde_json::Number::from_f64(row.try_get_unchecked::<f64, _>(column)?)
      .map(Value::Number)
      .unwrap_or(Value::Null),
    "TEXT" => Value::String(row.try_get_unchecked::<String, _>(column)?),
    _ => Value::Null,
  };

  Ok(value)
}

fn workout_from_row(row: &SqliteRow) -> Result<Workout> {
  let id: i64 = row.try_get("id")?;
  let date: String = row.try_get("date")?;

  let date = parse_db_timestamp(&date)
    .ok_or_else(|| AnalyticsError::InvalidRecord(format!("workout {} has unparseable date '{}'", id, date)))?;

  Ok(Workout {
    id,
    user_id: row.try_get("user_id")?,
    name: row.try_get("name")?,
    date,
  })
}

/// Decode workout rows, skipping any that cannot be read
fn workouts_from_rows(rows: &[SqliteRow]) -> Vec<Workout> {
  rows
    .iter()
    .filter_map(|row| match workout_from_row(row) {
      Ok(workout) => Some(workout),
      Err(e) => {
        warn!("Skipping workout row: {}", e);
        None
      }
    })
    .collect()
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
  builder.push("(");
  let mut separated = builder.separated(", ");
  for id in ids {
    separated.push_bind(*id);
  }
  separated.push_unseparated(")");
}

/// ---------------------------------------------------------------------------
/// WorkoutStore
/// ---------------------------------------------------------------------------

#[async_trait]
impl WorkoutStore for SqliteStore {
  async fn workout(&self, id: i64) -> Result<Option<Workout>> {
    let row = sqlx::query("SELECT id, user_id, name, date FROM workouts WHERE id = ?")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;

    row.as_ref().map(workout_from_row).transpose()
  }

  async fn workouts_in_range(&self, user_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Workout>> {
    let rows = sqlx::query(
      r#"
      SELECT id, user_id, name, date
      FROM workouts
      WHERE user_id = ?
        AND julianday(date) >= julianday(?)
        AND julianday(date) <= julianday(?)
      ORDER BY julianday(date) ASC, id ASC
      "#,
    )
    .bind(user_id)
    .bind(to_db_bound(start))
    .bind(to_db_bound(end))
    .fetch_all(&self.pool)
    .await?;

    Ok(workouts_from_rows(&rows))
  }

  async fn recent_workouts_with_exercise(
    &self,
    user_id: i64,
    exercise_id: i64,
    since: DateTime<Utc>,
    limit: u32,
  ) -> Result<Vec<Workout>> {
    let rows = sqlx::query(
      r#"
      SELECT DISTINCT w.id, w.user_id, w.name, w.date
      FROM workouts w
      JOIN workout_exercises we ON we.workout_id = w.id
      WHERE w.user_id = ?
        AND we.exercise_id = ?
        AND julianday(w.date) >= julianday(?)
      ORDER BY julianday(w.date) DESC, w.id DESC
      LIMIT ?
      "#,
    )
    .bind(user_id)
    .bind(exercise_id)
    .bind(to_db_bound(since))
    .bind(i64::from(limit))
    .fetch_all(&self.pool)
    .await?;

    Ok(workouts_from_rows(&rows))
  }

  async fn workout_exercises(&self, workout_ids: &[i64]) -> Result<Vec<WorkoutExercise>> {
    if workout_ids.is_empty() {
      return Ok(Vec::new());
    }

    let rows = self
      .fetch_by_ids(
        "SELECT id, workout_id, exercise_id, position FROM workout_exercises WHERE workout_id IN ",
        workout_ids,
        " ORDER BY workout_id, position, id",
      )
      .await?;

    let mut slots = rows
      .iter()
      .map(|row| -> Result<WorkoutExercise> {
        Ok(WorkoutExercise {
          id: row.try_get("id")?,
          workout_id: row.try_get("workout_id")?,
          exercise_id: row.try_get("exercise_id")?,
          position: row.try_get::<Option<i64>, _>("position")?.unwrap_or(0),
        })
      })
      .collect::<Result<Vec<_>>>()?;

    slots.sort_by_key(|slot| (slot.workout_id, slot.position, slot.id));
    Ok(slots)
  }

  async fn exercise_sets(&self, workout_exercise_ids: &[i64]) -> Result<Vec<ExerciseSet>> {
    if workout_exercise_ids.is_empty() {
      return Ok(Vec::new());
    }

    let rows = self
      .fetch_by_ids(
        "SELECT id, workout_exercise_id, set_number, weight_kg, reps, rir, rpe FROM exercise_sets WHERE workout_exercise_id IN ",
        workout_exercise_ids,
        " ORDER BY workout_exercise_id, set_number, id",
      )
      .await?;

    let mut sets = rows
      .iter()
      .map(|row| -> Result<ExerciseSet> {
        Ok(ExerciseSet {
          id: row.try_get("id")?,
          workout_exercise_id: row.try_get("workout_exercise_id")?,
          set_number: row.try_get("set_number")?,
          weight_kg: loose_value(row, "weight_kg")?,
          reps: loose_value(row, "reps")?,
          rir: loose_value(row, "rir")?,
          rpe: loose_value(row, "rpe")?,
        })
      })
      .collect::<Result<Vec<_>>>()?;

    sets.sort_by_key(|set| (set.workout_exercise_id, set.set_number, set.id));
    Ok(sets)
  }

  async fn exercises(&self, ids: &[i64]) -> Result<Vec<Exercise>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    let rows = self
      .fetch_by_ids("SELECT id, name, muscle_coefficients FROM exercises WHERE id IN ", ids, "")
      .await?;
    rows.iter().map(exercise_from_row).collect()
  }

  async fn exercises_by_name(&self, names: &[&str]) -> Result<Vec<Exercise>> {
    if names.is_empty() {
      return Ok(Vec::new());
    }

    let mut exercises = Vec::new();
    for chunk in names.chunks(IN_LIST_CHUNK) {
      let mut builder = QueryBuilder::new("SELECT id, name, muscle_coefficients FROM exercises WHERE name IN (");
      let mut separated = builder.separated(", ");
      for name in chunk {
        separated.push_bind(name.to_string());
      }
      separated.push_unseparated(")");

      let rows = builder.build().fetch_all(&self.pool).await?;
      for row in &rows {
        exercises.push(exercise_from_row(row)?);
      }
    }

    exercises.sort_by_key(|exercise| exercise.id);
    Ok(exercises)
  }

  async fn user(&self, id: i64) -> Result<Option<User>> {
    let row: Option<(i64, Option<String>)> = sqlx::query_as("SELECT id, training_goal FROM users WHERE id = ?")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;

    Ok(row.map(|(id, training_goal)| User { id, training_goal }))
  }
}

fn exercise_from_row(row: &SqliteRow) -> Result<Exercise> {
  Ok(Exercise {
    id: row.try_get("id")?,
    name: row.try_get("name")?,
    muscle_coefficients: loose_value(row, "muscle_coefficients")?,
  })
}
