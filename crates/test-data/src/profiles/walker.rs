//! Walker athletic profile.

use workout_map::models::ActivityType;

use super::AthleteProfile;

/// Athletic profile for walks.
///
/// Based on typical recreational walking:
/// - Base speed: ~5 km/h (1.4 m/s)
/// - Walks between 1 and 8 km
#[derive(Debug, Clone)]
pub struct WalkerProfile {
    base_speed: f64,
    variance: f64,
}

impl Default for WalkerProfile {
    fn default() -> Self {
        Self {
            base_speed: 1.4, // ~5 km/h
            variance: 0.12,
        }
    }
}

impl WalkerProfile {
    /// Creates a new walker profile with specified base speed.
    ///
    /// # Arguments
    /// * `speed_kmh` - Base speed in km/h
    pub fn with_speed(speed_kmh: f64) -> Self {
        let base_speed = speed_kmh / 3.6;
        Self {
            base_speed,
            ..Default::default()
        }
    }

    /// Creates a brisk walker profile (~6.5 km/h base).
    pub fn brisk() -> Self {
        Self::with_speed(6.5)
    }

    /// A dog walk: slow, with a lot of stopping and starting.
    pub fn dog_walk() -> Self {
        Self {
            base_speed: 1.0,
            variance: 0.2,
        }
    }
}

impl AthleteProfile for WalkerProfile {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Walking
    }

    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn distance_range_m(&self) -> (f64, f64) {
        (1_000.0, 8_000.0)
    }
}
