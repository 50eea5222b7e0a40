use std::{fmt, str::FromStr};

use enum_map::Enum;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::scoring;

/// Category of a recorded workout.
///
/// Only walking, running and cycling are offered in the filter; everything
/// else the health store reports collapses into `Other`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Enum,
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Walking,
    Running,
    Cycling,
    Other,
}

impl ActivityType {
    pub const ALL: [ActivityType; 4] = [
        ActivityType::Walking,
        ActivityType::Running,
        ActivityType::Cycling,
        ActivityType::Other,
    ];

    /// Types the filter lets the user pick.
    pub const SELECTABLE: [ActivityType; 3] = [
        ActivityType::Cycling,
        ActivityType::Running,
        ActivityType::Walking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Walking => "walking",
            ActivityType::Running => "running",
            ActivityType::Cycling => "cycling",
            ActivityType::Other => "other",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ActivityType::Running => "Running",
            ActivityType::Cycling => "Biking",
            ActivityType::Walking => "Walking",
            ActivityType::Other => "Other",
        }
    }

    /// Symbol name for the legend, `None` when the type has no symbol.
    pub fn icon(self) -> Option<&'static str> {
        match self {
            ActivityType::Running | ActivityType::Walking => Some("figure.walk"),
            ActivityType::Cycling => Some("bicycle"),
            ActivityType::Other => None,
        }
    }

    pub fn color(self) -> Color {
        match self {
            ActivityType::Running => Color::Red,
            ActivityType::Walking => Color::Blue,
            ActivityType::Cycling => Color::Green,
            ActivityType::Other => Color::Black,
        }
    }

    /// Lenient mapping used for health store records: anything we don't
    /// draw separately becomes `Other`.
    pub fn from_store_name(name: &str) -> Self {
        name.parse().unwrap_or(ActivityType::Other)
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity type: {0}")]
pub struct UnknownActivityType(pub String);

impl FromStr for ActivityType {
    type Err = UnknownActivityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "walking" | "walk" => Ok(ActivityType::Walking),
            "running" | "run" => Ok(ActivityType::Running),
            "cycling" | "biking" | "ride" => Ok(ActivityType::Cycling),
            "other" => Ok(ActivityType::Other),
            other => Err(UnknownActivityType(other.to_string())),
        }
    }
}

/// Display color of a route overlay and its legend entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Black,
}

impl Color {
    pub fn hex(self) -> &'static str {
        match self {
            Color::Red => "#ff3b30",
            Color::Blue => "#007aff",
            Color::Green => "#34c759",
            Color::Black => "#000000",
        }
    }
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

/// One timestamped point of a recorded route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: OffsetDateTime) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A completed workout with its full, time-ordered route.
///
/// Only the aggregator builds these, and only after every route segment of
/// the workout has been read and merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workout {
    id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    end: OffsetDateTime,
    activity_type: ActivityType,
    route: Vec<LocationSample>,
    distance_meters: f64,
    duration_seconds: f64,
}

impl Workout {
    /// Builds a workout, sorting the route by timestamp. The sort is stable,
    /// so samples sharing a timestamp keep their arrival order.
    pub fn new(
        id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
        activity_type: ActivityType,
        mut route: Vec<LocationSample>,
    ) -> Self {
        route.sort_by_key(|sample| sample.timestamp);
        let scores = scoring::score_route(&route);
        Self {
            id,
            start,
            end,
            activity_type,
            route,
            distance_meters: scores.distance,
            duration_seconds: scores.duration,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    pub fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    pub fn route(&self) -> &[LocationSample] {
        &self.route
    }

    /// Total route length in meters.
    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    /// Seconds between the first and last route sample.
    pub fn route_duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

/// Map viewport: a center and the span of degrees visible around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    pub const fn new(center: Coordinate, latitude_delta: f64, longitude_delta: f64) -> Self {
        Self {
            center,
            latitude_delta,
            longitude_delta,
        }
    }

    /// Same span, new center.
    pub fn recentered(&self, center: Coordinate) -> Self {
        Self { center, ..*self }
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::new(Coordinate::new(44.643324, -63.713239), 0.1, 0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_activity_type_presentation() {
        assert_eq!(ActivityType::Cycling.display_name(), "Biking");
        assert_eq!(ActivityType::Running.color(), Color::Red);
        assert_eq!(ActivityType::Walking.color(), Color::Blue);
        assert_eq!(ActivityType::Cycling.icon(), Some("bicycle"));
        assert_eq!(ActivityType::Other.icon(), None);
    }

    #[test]
    fn test_activity_type_parsing() {
        assert_eq!("Running".parse::<ActivityType>(), Ok(ActivityType::Running));
        assert_eq!("biking".parse::<ActivityType>(), Ok(ActivityType::Cycling));
        assert!("swimming".parse::<ActivityType>().is_err());
        assert_eq!(
            ActivityType::from_store_name("swimming"),
            ActivityType::Other
        );
    }

    #[test]
    fn test_workout_sorts_route() {
        let t0 = OffsetDateTime::UNIX_EPOCH;
        let route = vec![
            LocationSample::new(44.002, -63.0, t0 + Duration::seconds(20)),
            LocationSample::new(44.000, -63.0, t0),
            LocationSample::new(44.001, -63.0, t0 + Duration::seconds(10)),
        ];

        let workout = Workout::new(
            Uuid::new_v4(),
            t0,
            t0 + Duration::seconds(20),
            ActivityType::Walking,
            route,
        );

        let lats: Vec<f64> = workout.route().iter().map(|s| s.latitude).collect();
        assert_eq!(lats, vec![44.000, 44.001, 44.002]);
        assert!(workout.distance_meters() > 200.0);
        assert_eq!(workout.route_duration_seconds(), 20.0);
    }

    #[test]
    fn test_region_recentered_keeps_span() {
        let region = Region::default().recentered(Coordinate::new(40.0, -105.0));
        assert_eq!(region.center, Coordinate::new(40.0, -105.0));
        assert_eq!(region.latitude_delta, 0.1);
    }
}
