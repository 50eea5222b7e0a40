//! Workout generators.
//!
//! - [`WorkoutGenerator`]: names a workout, generates its track and splits it
//!   into route chunks
//! - [`LibraryWriter`]: writes generated workouts as a GPX workout library

pub mod workout;

pub use workout::{
    GeneratedWorkout, LibraryError, LibrarySummary, LibraryWriter, WorkoutGenerator,
    WorkoutNameConfig,
};
