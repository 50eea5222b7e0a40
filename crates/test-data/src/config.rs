//! Configuration types for test data generation.

use serde::{Deserialize, Serialize};
use workout_map::models::ActivityType;

/// Geographic bounding box defined by southwest and northeast corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude (south)
    pub min_lat: f64,
    /// Minimum longitude (west)
    pub min_lon: f64,
    /// Maximum latitude (north)
    pub max_lat: f64,
    /// Maximum longitude (east)
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Returns a random point within the bounding box.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> (f64, f64) {
        let lat = rng.gen_range(self.min_lat..self.max_lat);
        let lon = rng.gen_range(self.min_lon..self.max_lon);
        (lat, lon)
    }

    /// Returns the center of the bounding box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Pre-defined geographic regions for test data generation.
#[derive(Debug, Clone, Copy)]
pub struct Region;

impl Region {
    /// Around the map's default center, west of Halifax.
    pub const HALIFAX: BoundingBox = BoundingBox::new(44.59, -63.79, 44.70, -63.63);

    /// Boulder, CO area.
    pub const BOULDER: BoundingBox = BoundingBox::new(39.9, -105.5, 40.1, -105.2);
}

/// Configuration for seeding a workout library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Number of workouts to generate.
    pub workout_count: usize,

    /// Target region for route generation.
    pub region: BoundingBox,

    /// Types drawn from, uniformly.
    pub activity_types: Vec<ActivityType>,

    /// Probability that a workout is recorded as several route chunks.
    pub chunk_probability: f64,

    /// Upper bound on chunks per chunked workout.
    pub max_chunks: usize,

    /// RNG seed for reproducible libraries.
    pub seed: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            workout_count: 30,
            region: Region::HALIFAX,
            activity_types: ActivityType::SELECTABLE.to_vec(),
            chunk_probability: 0.25,
            max_chunks: 3,
            seed: 12345,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_random_point_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let (lat, lon) = Region::HALIFAX.random_point(&mut rng);
            assert!(Region::HALIFAX.contains(lat, lon));
        }
    }

    #[test]
    fn test_default_region_holds_map_center() {
        assert!(Region::HALIFAX.contains(44.643324, -63.713239));
    }
}
