//! Cyclist athletic profile.

use workout_map::models::ActivityType;

use super::AthleteProfile;

/// Athletic profile for cycling activities.
///
/// - Base speed: ~25 km/h (7.0 m/s)
/// - Rides between 10 and 60 km
#[derive(Debug, Clone)]
pub struct CyclistProfile {
    base_speed: f64,
    variance: f64,
}

impl Default for CyclistProfile {
    fn default() -> Self {
        Self {
            base_speed: 7.0, // ~25 km/h
            variance: 0.10,
        }
    }
}

impl CyclistProfile {
    /// Creates a new cyclist profile with specified base speed.
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

    /// A commuter on a city bike (~16 km/h base, stop-and-go variance).
    pub fn commuter() -> Self {
        Self {
            base_speed: 4.5,
            variance: 0.18,
        }
    }
}

impl AthleteProfile for CyclistProfile {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Cycling
    }

    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn distance_range_m(&self) -> (f64, f64) {
        (10_000.0, 60_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faster_than_other_profiles() {
        let cyclist = CyclistProfile::default();
        let runner = crate::profiles::RunnerProfile::default();
        assert!(cyclist.base_speed_mps() > runner.base_speed_mps());
    }

    #[test]
    fn test_with_speed() {
        let profile = CyclistProfile::with_speed(36.0);
        assert!((profile.base_speed_mps() - 10.0).abs() < 1e-9);
    }
}
