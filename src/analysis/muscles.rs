//! Muscle coefficient parsing and volume attribution
//!
//! Exercise metadata stores a muscle-group -> involvement mapping that may
//! arrive as JSON text, as a native object, or not at all. `parse` is the
//! only place that looks at the stored shape; everything downstream works
//! with the normalized map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::numeric;

/// Bucket used when an exercise has no usable coefficients
pub const UNKNOWN_MUSCLE: &str = "Unknown";

/// Normalized coefficients. Values are positive and sum to 1.0, or the map
/// is exactly `{"Unknown": 1.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MuscleCoefficients(BTreeMap<String, f64>);

impl MuscleCoefficients {
  pub fn fallback() -> Self {
    Self(BTreeMap::from([(UNKNOWN_MUSCLE.to_string(), 1.0)]))
  }

  /// Decode and normalize a stored coefficient value
  pub fn parse(raw: &Value) -> Self {
    let decoded;
    let mapping = match raw {
      Value::String(text) => {
        if text.trim().is_empty() {
          return Self::fallback();
        }
        decoded = match serde_json::from_str::<Value>(text) {
          Ok(value) => value,
          Err(_) => return Self::fallback(),
        };
        &decoded
      }
      other => other,
    };

    let Value::Object(entries) = mapping else {
      return Self::fallback();
    };

    let valid: Vec<(String, f64)> = entries
      .iter()
      .filter_map(|(muscle, value)| {
        numeric::try_f64(value)
          .filter(|v| *v > 0.0)
          .map(|v| (muscle.clone(), v))
      })
      .collect();

    let total: f64 = valid.iter().map(|(_, v)| v).sum();
    if total <= 0.0 || !total.is_finite() {
      return Self::fallback();
    }

    Self(valid.into_iter().map(|(muscle, v)| (muscle, v / total)).collect())
  }

  pub fn is_fallback(&self) -> bool {
    self.0.len() == 1 && self.0.contains_key(UNKNOWN_MUSCLE)
  }

  pub fn get(&self, muscle: &str) -> Option<f64> {
    self.0.get(muscle).copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
    self.0.iter().map(|(muscle, c)| (muscle.as_str(), *c))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn total(&self) -> f64 {
    self.0.values().sum()
  }

  /// Spread `volume` over muscle groups in proportion to the coefficients
  pub fn attribute(&self, volume: f64, into: &mut BTreeMap<String, f64>) {
    if volume <= 0.0 {
      return;
    }
    for (muscle, coefficient) in self.iter() {
      *into.entry(muscle.to_string()).or_insert(0.0) += volume * coefficient;
    }
  }
}

impl Default for MuscleCoefficients {
  fn default() -> Self {
    Self::fallback()
  }
}
