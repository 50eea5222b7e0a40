//! Athletic performance profiles.
//!
//! Profiles define realistic speeds and workout lengths for each activity
//! type. Track generators use them to produce believable timestamps.

mod cyclist;
mod runner;
mod walker;

pub use cyclist::CyclistProfile;
pub use runner::RunnerProfile;
pub use walker::WalkerProfile;

use workout_map::models::ActivityType;

pub trait AthleteProfile: Send + Sync {
    /// Which kind of workout this profile records.
    fn activity_type(&self) -> ActivityType;

    /// Base moving speed in meters per second.
    fn base_speed_mps(&self) -> f64;

    /// Day-to-day performance variance as a coefficient of variation (0.0 - 1.0).
    ///
    /// A value of 0.1 means typical day-to-day variation of ±10%.
    fn variance(&self) -> f64;

    /// Typical workout length in meters, as a (min, max) range.
    fn distance_range_m(&self) -> (f64, f64);
}

/// The default profile for an activity type. Types without a profile of
/// their own move like walkers.
pub fn profile_for(activity_type: ActivityType) -> Box<dyn AthleteProfile> {
    match activity_type {
        ActivityType::Running => Box::new(RunnerProfile::default()),
        ActivityType::Cycling => Box::new(CyclistProfile::default()),
        ActivityType::Walking | ActivityType::Other => Box::new(WalkerProfile::default()),
    }
}

/// Speed for one step, given a sampled variance factor.
pub fn speed_with_variance(profile: &dyn AthleteProfile, variance_factor: f64) -> f64 {
    // Minimum 0.5 m/s to avoid division issues
    (profile.base_speed_mps() * variance_factor).max(0.5)
}

/// Samples a variance factor from normal distribution.
/// Returns a multiplier around 1.0.
pub fn sample_variance(profile: &dyn AthleteProfile, rng: &mut impl rand::Rng) -> f64 {
    use rand_distr::{Distribution, Normal};

    match Normal::new(1.0, profile.variance()) {
        Ok(normal) if profile.variance() > 0.0 => normal.sample(rng).clamp(0.7, 1.4),
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_profile_for_each_type() {
        for activity_type in ActivityType::SELECTABLE {
            assert_eq!(profile_for(activity_type).activity_type(), activity_type);
        }
        assert_eq!(
            profile_for(ActivityType::Other).activity_type(),
            ActivityType::Walking
        );
    }

    #[test]
    fn test_sample_variance_is_clamped() {
        let profile = WalkerProfile::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let factor = sample_variance(&profile, &mut rng);
            assert!((0.7..=1.4).contains(&factor));
        }
    }

    #[test]
    fn test_speed_floor() {
        let profile = WalkerProfile::with_speed(0.1);
        assert_eq!(speed_with_variance(&profile, 1.0), 0.5);
    }
}
