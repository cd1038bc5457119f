pub mod exercise;
pub mod snapshot;
pub mod workout;

pub use exercise::{Exercise, User};
pub use snapshot::{ExerciseEntry, WorkoutSnapshot};
pub use workout::{ExerciseSet, Workout, WorkoutExercise};
