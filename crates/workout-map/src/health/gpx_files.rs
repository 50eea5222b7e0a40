//! Workout libraries stored as GPX files.
//!
//! Layout is `<root>/<activity type>/<name>.gpx`. Every file is one workout
//! and every `<trk>` in it is one route object of that workout.

use std::path::Path;

use gpx::{Gpx, read};
use thiserror::Error;
use time::OffsetDateTime;

use super::InMemoryHealthStore;
use crate::models::{ActivityType, LocationSample};

#[derive(Debug, Error)]
pub enum GpxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GPX parse error: {0}")]
    Parse(#[from] gpx::errors::GpxError),
    #[error("No tracks found in GPX file")]
    NoTracks,
}

/// Loads workout routes from GPX files.
pub struct GpxLoader;

impl GpxLoader {
    /// Loads the routes of one GPX file, one entry per track.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Vec<LocationSample>>, GpxError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let gpx: Gpx = read(reader)?;

        Self::extract_routes(&gpx)
    }

    /// Loads routes from GPX data in memory.
    pub fn load_bytes(data: &[u8]) -> Result<Vec<Vec<LocationSample>>, GpxError> {
        let reader = std::io::Cursor::new(data);
        let gpx: Gpx = read(reader)?;

        Self::extract_routes(&gpx)
    }

    /// Reads a whole library into a store. Files that fail to parse are
    /// skipped with a warning; an unreadable root is an error.
    pub fn load_library(
        root: impl AsRef<Path>,
        batch_size: usize,
    ) -> Result<InMemoryHealthStore, GpxError> {
        let root = root.as_ref();
        let mut store = InMemoryHealthStore::new(batch_size);

        let mut type_dirs: Vec<_> = std::fs::read_dir(root)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        type_dirs.sort();

        for dir in type_dirs {
            let type_name = dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let activity_type = ActivityType::from_store_name(type_name);

            let mut files: Vec<_> = std::fs::read_dir(&dir)?
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "gpx"))
                .collect();
            files.sort();

            for file in files {
                match Self::load_file(&file) {
                    Ok(routes) => {
                        store.add_workout(activity_type, routes);
                    }
                    Err(e) => {
                        tracing::warn!("Skipping {}: {e}", file.display());
                    }
                }
            }
        }

        tracing::info!(
            "Loaded {} workouts from {}",
            store.workout_count(),
            root.display()
        );

        Ok(store)
    }

    /// Extracts one sample list per track. Points without a timestamp cannot
    /// be ordered and are dropped.
    fn extract_routes(gpx: &Gpx) -> Result<Vec<Vec<LocationSample>>, GpxError> {
        if gpx.tracks.is_empty() {
            return Err(GpxError::NoTracks);
        }

        let mut routes = Vec::with_capacity(gpx.tracks.len());
        let mut untimed = 0usize;

        for track in &gpx.tracks {
            let mut samples = Vec::new();
            for segment in &track.segments {
                for waypoint in &segment.points {
                    let point = waypoint.point();
                    match waypoint.time {
                        Some(t) => samples.push(LocationSample::new(
                            point.y(),
                            point.x(),
                            OffsetDateTime::from(t),
                        )),
                        None => untimed += 1,
                    }
                }
            }
            routes.push(samples);
        }

        if untimed > 0 {
            tracing::warn!("Dropped {untimed} track points without a timestamp");
        }

        Ok(routes)
    }
}
