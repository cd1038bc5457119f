//! Lenient numeric reads over stored values
//!
//! Persisted set fields and coefficient values may be numbers, numeric
//! text, or null. Every arithmetic path reads them through here; nothing
//! in this module fails.

use serde_json::Value;

/// Interpret a stored value as a float, or `None` if it is not numeric.
/// Non-finite results (NaN, infinities) count as not numeric.
pub fn try_f64(value: &Value) -> Option<f64> {
  let parsed = match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  parsed.filter(|v| v.is_finite())
}

/// Interpret a stored value as a float, falling back to `0.0`
pub fn coerce_f64(value: &Value) -> f64 {
  try_f64(value).unwrap_or(0.0)
}

/// Interpret a stored value as a whole count, truncating any fraction.
/// Falls back to `0`.
pub fn coerce_i64(value: &Value) -> i64 {
  match value {
    Value::Number(n) if n.is_i64() => n.as_i64().unwrap_or(0),
    _ => try_f64(value).map(|v| v.trunc() as i64).unwrap_or(0),
  }
}

/// Round half away from zero to the given number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
  let factor = 10f64.powi(decimals);
  (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_coerce_numbers() {
    assert_eq!(coerce_f64(&json!(80)), 80.0);
    assert_eq!(coerce_f64(&json!(82.5)), 82.5);
    assert_eq!(coerce_i64(&json!(8)), 8);
  }

  #[test]
  fn test_coerce_numeric_text() {
    assert_eq!(coerce_f64(&json!("62.25")), 62.25);
    assert_eq!(coerce_f64(&json!("  40 ")), 40.0);
    assert_eq!(coerce_i64(&json!("10")), 10);
    assert_eq!(coerce_i64(&json!("7.9")), 7);
  }

  #[test]
  fn test_coerce_garbage_is_zero() {
    assert_eq!(coerce_f64(&Value::Null), 0.0);
    assert_eq!(coerce_f64(&json!("heavy")), 0.0);
    assert_eq!(coerce_f64(&json!(true)), 0.0);
    assert_eq!(coerce_f64(&json!([1, 2])), 0.0);
    assert_eq!(coerce_f64(&json!({"kg": 5})), 0.0);
    assert_eq!(coerce_i64(&Value::Null), 0);
  }

  #[test]
  fn test_non_finite_text_is_rejected() {
    assert_eq!(try_f64(&json!("NaN")), None);
    assert_eq!(try_f64(&json!("inf")), None);
    assert_eq!(coerce_f64(&json!("-infinity")), 0.0);
  }

  #[test]
  fn test_round_to() {
    assert_eq!(round_to(29.025806, 2), 29.03);
    assert_eq!(round_to(66.66666, 1), 66.7);
    assert_eq!(round_to(0.0, 2), 0.0);
  }
}
