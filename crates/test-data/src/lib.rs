//! Synthetic workout libraries for workout-map.
//!
//! Generates believable GPS workouts per activity type and writes them as a
//! GPX library the server's workout store reads.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let config = SeedConfig {
//!     workout_count: 50,
//!     region: Region::HALIFAX,
//!     ..Default::default()
//! };
//! let mut rng = StdRng::seed_from_u64(config.seed);
//! let summary = LibraryWriter::new("./workouts").seed(&config, &mut rng).await?;
//! ```

pub mod config;
pub mod generators;
pub mod gpx;
pub mod profiles;
pub mod sources;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{BoundingBox, Region, SeedConfig};
    pub use crate::generators::{
        GeneratedWorkout, LibraryError, LibrarySummary, LibraryWriter, WorkoutGenerator,
    };
    pub use crate::gpx::generate_gpx;
    pub use crate::profiles::{
        AthleteProfile, CyclistProfile, RunnerProfile, WalkerProfile, profile_for,
    };
    pub use crate::sources::{ProceduralGenerator, TrackConfig};
    pub use rand::{SeedableRng, rngs::StdRng};
    pub use workout_map::models::ActivityType;
}
