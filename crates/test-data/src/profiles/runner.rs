//! Runner athletic profile.

use workout_map::models::ActivityType;

use super::AthleteProfile;

/// Athletic profile for running activities.
///
/// Based on typical recreational to competitive runner performance:
/// - Base pace: ~5:00/km (3.5 m/s)
/// - Workouts between 3 and 15 km
#[derive(Debug, Clone)]
pub struct RunnerProfile {
    /// Base speed in m/s.
    base_speed: f64,
    /// Performance variance (coefficient of variation).
    variance: f64,
}

impl Default for RunnerProfile {
    fn default() -> Self {
        Self {
            base_speed: 3.5, // ~5:00/km
            variance: 0.08,
        }
    }
}

impl RunnerProfile {
    /// Creates a new runner profile with specified base pace.
    ///
    /// # Arguments
    /// * `pace_min_per_km` - Base pace in minutes per kilometer (e.g., 5.0 for 5:00/km)
    pub fn with_pace(pace_min_per_km: f64) -> Self {
        let base_speed = 1000.0 / (pace_min_per_km * 60.0);
        Self {
            base_speed,
            ..Default::default()
        }
    }

    /// Creates a recreational runner profile (~6:00/km base pace).
    pub fn recreational() -> Self {
        Self::with_pace(6.0)
    }
}

impl AthleteProfile for RunnerProfile {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Running
    }

    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn distance_range_m(&self) -> (f64, f64) {
        (3_000.0, 15_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = RunnerProfile::default();
        assert!((profile.base_speed_mps() - 3.5).abs() < 0.01);
    }

    #[test]
    fn test_pace_conversion() {
        // 6:00/km is 1000 m in 360 s
        let profile = RunnerProfile::recreational();
        assert!((profile.base_speed_mps() - 1000.0 / 360.0).abs() < 1e-9);
    }
}
