//! Procedural track generation.

use geo::{Distance, Haversine, Point};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use time::{Duration, OffsetDateTime};
use workout_map::models::LocationSample;

use crate::config::BoundingBox;
use crate::profiles::{self, AthleteProfile};

/// Configuration for procedural track generation.
#[derive(Debug, Clone)]
pub struct TrackConfig {
    /// Target distance in meters.
    pub distance_meters: f64,
    /// Starting point (lat, lon). If None, random within bounds.
    pub start_point: Option<(f64, f64)>,
    /// Geographic bounds for the track.
    pub bounds: BoundingBox,
    /// GPS position jitter standard deviation in meters.
    pub gps_jitter_m: f64,
    /// Approximate distance between track points in meters.
    pub point_spacing_m: f64,
    /// Probability of inserting a pause (0.0 - 1.0).
    pub pause_probability: f64,
    /// Duration range for pauses (min, max) in seconds.
    pub pause_duration_range: (f64, f64),
    /// Time of the first sample.
    pub start_time: OffsetDateTime,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            distance_meters: 5000.0,
            start_point: None,
            bounds: crate::config::Region::HALIFAX,
            gps_jitter_m: 3.0,
            point_spacing_m: 10.0,
            pause_probability: 0.02,
            pause_duration_range: (30.0, 180.0),
            start_time: OffsetDateTime::now_utc(),
        }
    }
}

/// Generates synthetic GPS tracks with realistic characteristics.
pub struct ProceduralGenerator {
    config: TrackConfig,
}

impl ProceduralGenerator {
    pub fn new() -> Self {
        Self {
            config: TrackConfig::default(),
        }
    }

    /// Creates a generator for a specific region.
    pub fn for_region(bounds: BoundingBox) -> Self {
        Self {
            config: TrackConfig {
                bounds,
                ..Default::default()
            },
        }
    }

    /// Sets the target distance.
    pub fn with_distance(mut self, meters: f64) -> Self {
        self.config.distance_meters = meters;
        self
    }

    /// Sets the starting point.
    pub fn with_start(mut self, lat: f64, lon: f64) -> Self {
        self.config.start_point = Some((lat, lon));
        self
    }

    pub fn with_start_time(mut self, start_time: OffsetDateTime) -> Self {
        self.config.start_time = start_time;
        self
    }

    /// Sets GPS jitter amount.
    pub fn with_gps_jitter(mut self, meters: f64) -> Self {
        self.config.gps_jitter_m = meters;
        self
    }

    /// Sets point spacing.
    pub fn with_point_spacing(mut self, meters: f64) -> Self {
        self.config.point_spacing_m = meters;
        self
    }

    /// Sets pause parameters.
    pub fn with_pauses(mut self, probability: f64, min_sec: f64, max_sec: f64) -> Self {
        self.config.pause_probability = probability;
        self.config.pause_duration_range = (min_sec, max_sec);
        self
    }

    /// Generates a timed track for the given profile.
    pub fn generate(&self, profile: &dyn AthleteProfile, rng: &mut impl Rng) -> Vec<LocationSample> {
        let start = self
            .config
            .start_point
            .unwrap_or_else(|| self.config.bounds.random_point(rng));

        let path = self.generate_path(start, rng);
        self.apply_timing(path, profile, rng)
    }

    /// Generates a simple path (coordinates only, no timing).
    pub fn generate_path(&self, start: (f64, f64), rng: &mut impl Rng) -> Vec<(f64, f64)> {
        let mut path = vec![start];
        let mut current = start;
        let mut total_distance = 0.0;

        // Random walk with some momentum to create natural-looking paths
        let mut heading = rng.gen_range(0.0..std::f64::consts::TAU);

        while total_distance < self.config.distance_meters {
            heading += rng.gen_range(-0.3..0.3);

            let step = self.config.point_spacing_m * rng.gen_range(0.8..1.2);

            // 1 degree of latitude is roughly 111 km
            let lat_delta = (step * heading.cos()) / 111_000.0;
            let lon_delta = (step * heading.sin()) / (111_000.0 * current.0.to_radians().cos());

            let (next_lat, next_lon, bounced_heading) =
                self.apply_bounds(current.0 + lat_delta, current.1 + lon_delta, heading);
            heading = bounced_heading;

            current = (next_lat, next_lon);
            path.push(current);
            total_distance += step;
        }

        path
    }

    /// Applies bounds checking with heading reversal.
    fn apply_bounds(&self, lat: f64, lon: f64, heading: f64) -> (f64, f64, f64) {
        let b = &self.config.bounds;
        let mut new_heading = heading;

        let lat = if lat < b.min_lat {
            new_heading = std::f64::consts::PI - heading;
            b.min_lat + (b.min_lat - lat).min(0.001)
        } else if lat > b.max_lat {
            new_heading = std::f64::consts::PI - heading;
            b.max_lat - (lat - b.max_lat).min(0.001)
        } else {
            lat
        };

        let lon = if lon < b.min_lon {
            new_heading = -heading;
            b.min_lon + (b.min_lon - lon).min(0.001)
        } else if lon > b.max_lon {
            new_heading = -heading;
            b.max_lon - (lon - b.max_lon).min(0.001)
        } else {
            lon
        };

        (lat, lon, new_heading)
    }

    /// Timestamps a path by moving along it at the profile's speed.
    fn apply_timing(
        &self,
        path: Vec<(f64, f64)>,
        profile: &dyn AthleteProfile,
        rng: &mut impl Rng,
    ) -> Vec<LocationSample> {
        let jitter = Normal::new(0.0, (self.config.gps_jitter_m / 111_000.0).max(0.0)).ok();

        let mut result = Vec::with_capacity(path.len());
        let mut timestamp = self.config.start_time;

        for (i, &(lat, lon)) in path.iter().enumerate() {
            if i > 0 {
                let (prev_lat, prev_lon) = path[i - 1];
                let distance =
                    Haversine.distance(Point::new(prev_lon, prev_lat), Point::new(lon, lat));

                let variance = profiles::sample_variance(profile, rng);
                let speed = profiles::speed_with_variance(profile, variance);

                let pause_seconds = if rng.r#gen::<f64>() < self.config.pause_probability {
                    let (min, max) = self.config.pause_duration_range;
                    rng.gen_range(min..max)
                } else {
                    0.0
                };

                timestamp += Duration::seconds_f64(distance / speed + pause_seconds);
            }

            result.push(LocationSample::new(
                lat + sample_jitter(jitter.as_ref(), rng),
                lon + sample_jitter(jitter.as_ref(), rng),
                timestamp,
            ));
        }

        result
    }
}

fn sample_jitter(jitter: Option<&Normal<f64>>, rng: &mut impl Rng) -> f64 {
    jitter.map_or(0.0, |normal| normal.sample(rng))
}

impl Default for ProceduralGenerator {
    fn default() -> Self {
        Self::new()
    }
}
