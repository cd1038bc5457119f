//! Exercise load recommendations
//!
//! The model that actually proposes sets lives behind `Recommender`. This
//! module assembles what it is told and interprets what it says back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::analysis::muscles::MuscleCoefficients;
use crate::analysis::numeric;
use crate::error::Result;
use crate::models::{Exercise, WorkoutSnapshot};

/// Goal assumed when the user has none on record
pub const DEFAULT_TRAINING_GOAL: &str = "hypertrophy";
/// How far back history is collected
pub const HISTORY_DAYS: i64 = 30;
/// How many past workouts are sent along
pub const HISTORY_WORKOUTS: u32 = 3;

/// ---------------------------------------------------------------------------
/// Request
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub training_goal: String,
}

impl UserProfile {
  pub fn new(training_goal: Option<&str>) -> Self {
    let goal = training_goal.map(str::trim).filter(|g| !g.is_empty());
    Self {
      training_goal: goal.unwrap_or(DEFAULT_TRAINING_GOAL).to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseInfo {
  pub id: i64,
  pub name: String,
  pub muscle_coefficients: MuscleCoefficients,
}

impl ExerciseInfo {
  /// Describe an exercise, or a numbered placeholder when the id did not
  /// resolve
  pub fn describe(id: i64, exercise: Option<&Exercise>) -> Self {
    match exercise {
      Some(exercise) => Self {
        id,
        name: exercise.name.clone(),
        muscle_coefficients: MuscleCoefficients::parse(&exercise.muscle_coefficients),
      },
      None => Self {
        id,
        name: format!("Exercise #{}", id),
        muscle_coefficients: MuscleCoefficients::fallback(),
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalWorkout {
  pub date: DateTime<Utc>,
  pub sets: Vec<HistoricalSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSet {
  pub set_number: i64,
  pub weight_kg: f64,
  pub reps: Option<i64>,
  pub rir: Option<f64>,
}

/// A set the lifter has already done in the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSet {
  pub set_number: i64,
  #[serde(default)]
  pub weight_kg: f64,
  #[serde(default)]
  pub reps: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rir: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
  pub user_profile: UserProfile,
  pub exercise_info: ExerciseInfo,
  pub recent_workouts: Vec<HistoricalWorkout>,
  pub current_sets: Vec<CurrentSet>,
}

impl RecommendationRequest {
  /// Nothing to base a recommendation on
  pub fn lacks_data(&self) -> bool {
    self.recent_workouts.is_empty() && self.current_sets.is_empty()
  }
}

/// Per-workout set history for one exercise. Only the first slot of the
/// exercise in each workout is used; workouts where it has no sets are
/// dropped.
pub fn build_history(snapshots: &[WorkoutSnapshot], exercise_id: i64) -> Vec<HistoricalWorkout> {
  snapshots
    .iter()
    .filter_map(|snapshot| {
      let entry = snapshot.exercises.iter().find(|e| e.exercise_id == exercise_id)?;
      if entry.sets.is_empty() {
        return None;
      }

      let sets = entry
        .sets
        .iter()
        .map(|set| HistoricalSet {
          set_number: set.set_number,
          weight_kg: numeric::coerce_f64(&set.weight_kg),
          reps: numeric::try_f64(&set.reps).map(|r| r.trunc() as i64),
          rir: numeric::try_f64(&set.rir),
        })
        .collect();

      Some(HistoricalWorkout {
        date: snapshot.date(),
        sets,
      })
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Recommender
/// ---------------------------------------------------------------------------

/// External service that proposes the next sets. Returns its raw reply
/// text; interpretation happens in `interpret_reply`.
#[async_trait]
pub trait Recommender: Send + Sync {
  async fn recommend(&self, request: &RecommendationRequest) -> Result<String>;
}

/// ---------------------------------------------------------------------------
/// Response
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedSet {
  pub set_number: i64,
  pub weight_kg: f64,
  pub reps: i64,
  /// Any other fields the recommender attached (rir, notes, ...)
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Recommendation {
  /// Additional sets to perform
  Sets {
    exercise_name: String,
    sets: Vec<RecommendedSet>,
    metadata: Value,
  },
  /// The recommender suggests stopping the exercise here
  Finish { message: String, metadata: Value },
  /// No history and no current sets: log a working set first
  RequiresInitialSet { message: String },
  Unavailable {
    message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    metadata: Value,
  },
}

impl Recommendation {
  pub fn requires_initial_set() -> Self {
    Self::RequiresInitialSet {
      message: "Log at least one set at your working weight to get a recommendation".to_string(),
    }
  }

  pub fn unavailable(message: impl Into<String>) -> Self {
    Self::Unavailable {
      message: message.into(),
      metadata: Value::Null,
    }
  }
}

/// Pull a JSON object out of free-form reply text (bare, fenced, or
/// embedded in prose)
pub fn extract_json(text: &str) -> Option<&str> {
  let trimmed = text.trim();
  if trimmed.starts_with('{') {
    return Some(trimmed);
  }

  if let Some(start) = text.find("```json") {
    let start = start + 7;
    if let Some(end) = text[start..].find("```") {
      return Some(text[start..start + end].trim());
    }
  }

  if let Some(start) = text.find("```") {
    let start = start + 3;
    // Skip language identifier if present
    let content_start = text[start..].find('\n').map(|i| start + i + 1).unwrap_or(start);
    if let Some(end) = text[content_start..].find("```") {
      return Some(text[content_start..content_start + end].trim());
    }
  }

  match (text.find('{'), text.rfind('}')) {
    (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
    _ => None,
  }
}

/// Turn the recommender's raw reply into a recommendation. Proposed sets are
/// renumbered to follow the `current_set_count` sets already done.
pub fn interpret_reply(raw: &str, exercise_name: &str, current_set_count: usize) -> Recommendation {
  let parsed = extract_json(raw).and_then(|json| serde_json::from_str::<Value>(json).ok());
  let Some(Value::Object(reply)) = parsed else {
    warn!("Recommender reply is not a JSON object");
    return Recommendation::unavailable("Recommender reply was not understood");
  };

  let metadata = reply
    .get("llm_metadata")
    .cloned()
    .unwrap_or_else(|| Value::Object(Map::new()));

  let first = match reply.get("recommendations") {
    Some(Value::Array(items)) if !items.is_empty() => &items[0],
    _ => {
      warn!("Recommender returned no recommendations");
      return Recommendation::Unavailable {
        message: "No recommendation was provided".to_string(),
        metadata,
      };
    }
  };

  let Value::Object(first) = first else {
    warn!("First recommendation is not an object");
    return Recommendation::Unavailable {
      message: "Recommendation has an unexpected shape".to_string(),
      metadata,
    };
  };

  let proposed: &[Value] = match first.get("sets_array") {
    Some(Value::Array(sets)) => sets.as_slice(),
    _ => &[],
  };

  if proposed.is_empty() {
    debug!("Recommender suggests finishing the exercise");
    return Recommendation::Finish {
      message: "Finish the exercise without adding sets".to_string(),
      metadata,
    };
  }

  let sets = proposed
    .iter()
    .enumerate()
    .filter_map(|(i, set)| {
      let Value::Object(fields) = set else {
        warn!("Skipping proposed set {} that is not an object", i);
        return None;
      };

      let mut extra = fields.clone();
      let weight_kg = extra.remove("weight_kg").map_or(0.0, |v| numeric::coerce_f64(&v));
      let reps = extra.remove("reps").map_or(0, |v| numeric::coerce_i64(&v));
      extra.remove("set_number");

      Some(RecommendedSet {
        set_number: (current_set_count + i + 1) as i64,
        weight_kg,
        reps,
        extra,
      })
    })
    .collect();

  let exercise_name = first
    .get("exercise_name")
    .and_then(Value::as_str)
    .unwrap_or(exercise_name)
    .to_string();

  Recommendation::Sets {
    exercise_name,
    sets,
    metadata,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{mock_entry, mock_exercise, mock_set, mock_snapshot};
  use serde_json::json;

  #[test]
  fn test_extract_json_variants() {
    assert_eq!(extract_json(r#"  {"a":1} "#), Some(r#"{"a":1}"#));
    assert_eq!(extract_json("Here:\n```json\n{\"a\":1}\n```\nthanks"), Some(r#"{"a":1}"#));
    assert_eq!(extract_json("```\n{\"b\":2}\n```"), Some(r#"{"b":2}"#));
    assert_eq!(extract_json(r#"Sure thing {"c":3} hope it helps"#), Some(r#"{"c":3}"#));
    assert_eq!(extract_json("no json here"), None);
  }

  #[test]
  fn test_sets_are_renumbered_after_current() {
    // Arrange
    let reply = r#"```json
    {
      "recommendations": [{
        "exercise_name": "Bench Press",
        "sets_array": [
          {"set_number": 1, "weight_kg": "82.5", "reps": 8, "rir": 2},
          "not a set",
          {"set_number": 2, "weight_kg": 80, "reps": "9"}
        ]
      }],
      "llm_metadata": {"model": "coach-v1"}
    }
    ```"#;

    // Act
    let recommendation = interpret_reply(reply, "Fallback Name", 2);

    // Assert
    let Recommendation::Sets { exercise_name, sets, metadata } = recommendation else {
      panic!("expected sets, got {:?}", recommendation);
    };
    assert_eq!(exercise_name, "Bench Press");
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].set_number, 3);
    assert_eq!(sets[0].weight_kg, 82.5);
    assert_eq!(sets[0].reps, 8);
    assert_eq!(sets[0].extra.get("rir"), Some(&json!(2)));
    // Index 1 was skipped; numbering follows the proposed position
    assert_eq!(sets[1].set_number, 5);
    assert_eq!(sets[1].reps, 9);
    assert_eq!(metadata, json!({"model": "coach-v1"}));
  }

  #[test]
  fn test_empty_sets_array_means_finish() {
    let reply = r#"{"recommendations": [{"sets_array": []}]}"#;
    assert!(matches!(interpret_reply(reply, "Squat", 4), Recommendation::Finish { .. }));

    let missing = r#"{"recommendations": [{"sets_array": "none"}]}"#;
    assert!(matches!(interpret_reply(missing, "Squat", 4), Recommendation::Finish { .. }));
  }

  #[test]
  fn test_unusable_replies_are_unavailable() {
    for reply in [
      "I cannot help with that",
      "[1, 2, 3]",
      r#"{"recommendations": []}"#,
      r#"{"recommendations": "later"}"#,
      r#"{"recommendations": ["three sets of eight"]}"#,
    ] {
      assert!(
        matches!(interpret_reply(reply, "Squat", 0), Recommendation::Unavailable { .. }),
        "reply should be unavailable: {}",
        reply
      );
    }
  }

  #[test]
  fn test_exercise_name_falls_back() {
    let reply = r#"{"recommendations": [{"sets_array": [{"weight_kg": 50, "reps": 10}]}]}"#;

    let Recommendation::Sets { exercise_name, sets, metadata } = interpret_reply(reply, "Lat Pulldown", 0) else {
      panic!("expected sets");
    };

    assert_eq!(exercise_name, "Lat Pulldown");
    assert_eq!(sets[0].set_number, 1);
    assert_eq!(metadata, json!({}));
  }

  #[test]
  fn test_status_tag_serialization() {
    let value = serde_json::to_value(Recommendation::requires_initial_set()).unwrap();
    assert_eq!(value["status"], json!("requires_initial_set"));

    let value = serde_json::to_value(Recommendation::unavailable("down")).unwrap();
    assert_eq!(value, json!({"status": "unavailable", "message": "down"}));
  }

  #[test]
  fn test_user_profile_default_goal() {
    assert_eq!(UserProfile::new(None).training_goal, "hypertrophy");
    assert_eq!(UserProfile::new(Some("  ")).training_goal, "hypertrophy");
    assert_eq!(UserProfile::new(Some("strength")).training_goal, "strength");
  }

  #[test]
  fn test_exercise_info_placeholder() {
    let info = ExerciseInfo::describe(42, None);
    assert_eq!(info.name, "Exercise #42");
    assert!(info.muscle_coefficients.is_fallback());

    let squat = mock_exercise(7, "Squat", json!({"quads": 3, "glutes": 1}));
    let info = ExerciseInfo::describe(7, Some(&squat));
    assert_eq!(info.name, "Squat");
    assert_eq!(info.muscle_coefficients.get("quads"), Some(0.75));
  }

  #[test]
  fn test_build_history_uses_first_matching_slot() {
    // Arrange
    let mut loose = mock_set(2, None, None);
    loose.rir = json!("2");
    let with_sets = mock_snapshot(
      1,
      2,
      vec![
        mock_entry(9, "Bench Press", Value::Null, vec![mock_set(1, Some(80.0), Some(8)), loose]),
        mock_entry(9, "Bench Press", Value::Null, vec![mock_set(1, Some(200.0), Some(1))]),
      ],
    );
    let without_sets = mock_snapshot(2, 5, vec![mock_entry(9, "Bench Press", Value::Null, vec![])]);
    let other = mock_snapshot(3, 6, vec![mock_entry(4, "Squat", Value::Null, vec![mock_set(1, Some(100.0), Some(5))])]);

    // Act
    let history = build_history(&[with_sets.clone(), without_sets, other], 9);

    // Assert
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].date, with_sets.date());
    assert_eq!(history[0].sets.len(), 2);
    assert_eq!(history[0].sets[0].weight_kg, 80.0);
    assert_eq!(history[0].sets[0].reps, Some(8));
    assert_eq!(history[0].sets[1].weight_kg, 0.0);
    assert_eq!(history[0].sets[1].reps, None);
    assert_eq!(history[0].sets[1].rir, Some(2.0));
  }
}
