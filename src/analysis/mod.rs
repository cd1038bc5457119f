//! Deterministic analysis layer for strength-training data
//!
//! Pure computations over hydrated workouts. Nothing here touches storage;
//! callers fetch snapshots through `store` and hand them in.

pub mod muscles;
pub mod numeric;
pub mod progress;
pub mod strength;
pub mod volume;
pub mod workout;

pub use muscles::{MuscleCoefficients, UNKNOWN_MUSCLE};
pub use progress::{ExerciseProgress, MuscleDistribution, ProgressReport, ProgressWindow, WeeklyProgress};
pub use strength::{estimate_one_rep_max, StrengthRecord, TRACKED_LIFTS};
pub use workout::{ExerciseBreakdown, SetDetail, WorkoutAnalytics};
