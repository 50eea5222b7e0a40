//! Workout generation and GPX library output.

use std::path::{Path, PathBuf};

use enum_map::EnumMap;
use rand::{Rng, seq::SliceRandom};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;
use workout_map::{
    models::{ActivityType, LocationSample},
    scoring::route_distance,
};

use crate::{
    config::{BoundingBox, SeedConfig},
    gpx::generate_gpx,
    profiles::{AthleteProfile, profile_for},
    sources::ProceduralGenerator,
};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No activity types to generate")]
    NoActivityTypes,
}

/// A generated workout, ready to be written out.
#[derive(Debug, Clone)]
pub struct GeneratedWorkout {
    pub name: String,
    pub activity_type: ActivityType,
    /// Route chunks in recording order.
    pub routes: Vec<Vec<LocationSample>>,
    pub distance_meters: f64,
}

impl GeneratedWorkout {
    pub fn start(&self) -> Option<OffsetDateTime> {
        self.routes.first()?.first().map(|s| s.timestamp)
    }

    pub fn sample_count(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }
}

/// Configuration for workout name generation.
#[derive(Debug, Clone)]
pub struct WorkoutNameConfig {
    pub running_prefixes: Vec<String>,
    pub cycling_prefixes: Vec<String>,
    pub walking_prefixes: Vec<String>,
    /// Location suffixes.
    pub location_suffixes: Vec<String>,
}

impl Default for WorkoutNameConfig {
    fn default() -> Self {
        Self {
            running_prefixes: vec![
                "Morning Run".into(),
                "Evening Run".into(),
                "Trail Run".into(),
                "Easy Run".into(),
                "Tempo Run".into(),
            ],
            cycling_prefixes: vec![
                "Morning Ride".into(),
                "Commute".into(),
                "Gravel Ride".into(),
                "Road Ride".into(),
            ],
            walking_prefixes: vec![
                "Morning Walk".into(),
                "Lunch Walk".into(),
                "Dog Walk".into(),
                "Evening Stroll".into(),
            ],
            location_suffixes: vec![
                "by the Lake".into(),
                "along the Rail Trail".into(),
                "through the Park".into(),
                "around the Basin".into(),
            ],
        }
    }
}

/// Generates workouts from athlete profiles.
pub struct WorkoutGenerator {
    name_config: WorkoutNameConfig,
    bounds: BoundingBox,
    chunk_probability: f64,
    max_chunks: usize,
}

impl WorkoutGenerator {
    pub fn new(bounds: BoundingBox) -> Self {
        Self {
            name_config: WorkoutNameConfig::default(),
            bounds,
            chunk_probability: 0.0,
            max_chunks: 1,
        }
    }

    pub fn from_config(config: &SeedConfig) -> Self {
        Self::new(config.region).with_chunking(config.chunk_probability, config.max_chunks)
    }

    /// Records some workouts as several route chunks, the way long
    /// recordings are split by the platform.
    pub fn with_chunking(mut self, probability: f64, max_chunks: usize) -> Self {
        self.chunk_probability = probability;
        self.max_chunks = max_chunks.max(1);
        self
    }

    pub fn generate(
        &self,
        profile: &dyn AthleteProfile,
        start_time: OffsetDateTime,
        rng: &mut impl Rng,
    ) -> GeneratedWorkout {
        let (min, max) = profile.distance_range_m();
        let distance = rng.gen_range(min..max);

        let track = ProceduralGenerator::for_region(self.bounds)
            .with_distance(distance)
            .with_start_time(start_time)
            .generate(profile, rng);
        let distance_meters = route_distance(&track);

        let chunks = if self.max_chunks > 1 && rng.r#gen::<f64>() < self.chunk_probability {
            rng.gen_range(2..=self.max_chunks)
        } else {
            1
        };

        GeneratedWorkout {
            name: self.generate_name(profile.activity_type(), rng),
            activity_type: profile.activity_type(),
            routes: split_route(track, chunks),
            distance_meters,
        }
    }

    fn generate_name(&self, activity_type: ActivityType, rng: &mut impl Rng) -> String {
        let prefixes = match activity_type {
            ActivityType::Running => &self.name_config.running_prefixes,
            ActivityType::Cycling => &self.name_config.cycling_prefixes,
            ActivityType::Walking | ActivityType::Other => &self.name_config.walking_prefixes,
        };
        let prefix = prefixes
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(activity_type.display_name());

        match self.name_config.location_suffixes.choose(rng) {
            Some(suffix) if rng.gen_bool(0.5) => format!("{prefix} {suffix}"),
            _ => prefix.to_string(),
        }
    }
}

/// Splits a track into `chunks` consecutive pieces of near-equal length.
/// Every piece keeps at least one sample.
pub fn split_route(track: Vec<LocationSample>, chunks: usize) -> Vec<Vec<LocationSample>> {
    let chunks = chunks.clamp(1, track.len().max(1));
    let size = track.len().div_ceil(chunks).max(1);
    track.chunks(size).map(<[LocationSample]>::to_vec).collect()
}

#[derive(Debug, Default)]
pub struct LibrarySummary {
    pub workouts: usize,
    pub files: Vec<PathBuf>,
    pub by_type: EnumMap<ActivityType, usize>,
    pub distance_meters: f64,
    pub chunked: usize,
}

/// Writes workouts as `<root>/<type>/<name>.gpx`.
pub struct LibraryWriter {
    root: PathBuf,
}

impl LibraryWriter {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub async fn write(&self, workout: &GeneratedWorkout) -> Result<PathBuf, LibraryError> {
        let dir = self.root.join(workout.activity_type.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let short_id = Uuid::new_v4().simple().to_string();
        let path = dir.join(format!("{}-{}.gpx", slugify(&workout.name), &short_id[..8]));
        tokio::fs::write(&path, generate_gpx(&workout.routes, &workout.name)).await?;

        debug!(
            "Wrote {} ({} samples in {} routes)",
            path.display(),
            workout.sample_count(),
            workout.routes.len()
        );
        Ok(path)
    }

    /// Generates and writes a whole library as described by `config`.
    ///
    /// Workouts are spaced a day apart, ending now.
    pub async fn seed(
        &self,
        config: &SeedConfig,
        rng: &mut impl Rng,
    ) -> Result<LibrarySummary, LibraryError> {
        if config.activity_types.is_empty() {
            return Err(LibraryError::NoActivityTypes);
        }

        let generator = WorkoutGenerator::from_config(config);
        let now = OffsetDateTime::now_utc();
        let mut summary = LibrarySummary::default();

        for i in 0..config.workout_count {
            let activity_type = config.activity_types[rng.gen_range(0..config.activity_types.len())];
            let profile = profile_for(activity_type);
            let start = now - Duration::days((config.workout_count - i) as i64)
                + Duration::minutes(rng.gen_range(6 * 60..20 * 60));

            let mut workout = generator.generate(profile.as_ref(), start, rng);
            workout.activity_type = activity_type;

            let path = self.write(&workout).await?;

            summary.workouts += 1;
            summary.files.push(path);
            summary.by_type[activity_type] += 1;
            summary.distance_meters += workout.distance_meters;
            if workout.routes.len() > 1 {
                summary.chunked += 1;
            }
        }

        info!(
            "Wrote {} workouts to {}",
            summary.workouts,
            self.root.display()
        );
        Ok(summary)
    }
}

fn slugify(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    slug.split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Region, profiles::RunnerProfile};
    use rand::{SeedableRng, rngs::StdRng};
    use workout_map::health::{GpxLoader, HealthStore};

    fn track(len: usize) -> Vec<LocationSample> {
        (0..len)
            .map(|i| {
                LocationSample::new(
                    44.64 + i as f64 * 1e-4,
                    -63.71,
                    OffsetDateTime::UNIX_EPOCH + Duration::seconds(i as i64),
                )
            })
            .collect()
    }

    #[test]
    fn test_split_route_keeps_every_sample_in_order() {
        let chunks = split_route(track(10), 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), track(10));

        assert_eq!(split_route(track(2), 5).len(), 2);
        assert_eq!(split_route(track(7), 1).len(), 1);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Morning Run by the Lake"), "morning-run-by-the-lake");
        assert_eq!(slugify("  Run & Ride!"), "run-ride");
    }

    #[test]
    fn test_generated_workout_matches_profile() {
        let generator = WorkoutGenerator::new(Region::HALIFAX).with_chunking(1.0, 3);
        let mut rng = StdRng::seed_from_u64(5);

        let workout = generator.generate(
            &RunnerProfile::default(),
            OffsetDateTime::UNIX_EPOCH,
            &mut rng,
        );

        assert_eq!(workout.activity_type, ActivityType::Running);
        assert!(workout.routes.len() >= 2);
        assert_eq!(workout.start(), Some(OffsetDateTime::UNIX_EPOCH));
        assert!(!workout.name.is_empty());
        assert!(workout.distance_meters > 1000.0);
    }

    #[tokio::test]
    async fn test_seeded_library_loads_back() {
        let root = std::env::temp_dir().join(format!("workout-library-{}", Uuid::new_v4()));
        let config = SeedConfig {
            workout_count: 6,
            chunk_probability: 0.5,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(config.seed);

        let summary = LibraryWriter::new(&root).seed(&config, &mut rng).await.unwrap();
        assert_eq!(summary.workouts, 6);
        assert_eq!(summary.by_type.values().sum::<usize>(), 6);

        let store = GpxLoader::load_library(&root, 200).unwrap();
        assert_eq!(store.workout_count(), 6);

        let types = ActivityType::SELECTABLE.into_iter().collect();
        let records = store.query_workouts(&types).await.unwrap();
        assert_eq!(records.len(), 6);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_seed_without_types_fails() {
        let config = SeedConfig {
            activity_types: Vec::new(),
            ..Default::default()
        };
        let result = LibraryWriter::new(std::env::temp_dir())
            .seed(&config, &mut StdRng::seed_from_u64(0))
            .await;
        assert!(matches!(result, Err(LibraryError::NoActivityTypes)));
    }
}
