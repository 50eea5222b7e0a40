use geo::{Distance as _, Haversine, geometry::Point};
use time::OffsetDateTime;

use crate::models::LocationSample;

pub trait RouteMetric {
    type Score;
    fn next_sample(&mut self, sample: &LocationSample);
    fn finish(&mut self) -> Self::Score;
}

/// Summary of a time-ordered route.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteScores {
    pub distance: f64,
    pub duration: f64,
}

pub fn score_route(route: &[LocationSample]) -> RouteScores {
    let mut distance = DistanceMetric::default();
    let mut duration = DurationMetric::default();

    for sample in route {
        distance.next_sample(sample);
        duration.next_sample(sample);
    }

    RouteScores {
        distance: distance.finish(),
        duration: duration.finish(),
    }
}

/// Sum of haversine distances between consecutive samples, in meters.
pub fn route_distance(route: &[LocationSample]) -> f64 {
    let mut metric = DistanceMetric::default();
    for sample in route {
        metric.next_sample(sample);
    }
    metric.finish()
}

#[derive(Debug, Clone, Default)]
struct DistanceMetric {
    total_distance: f64,
    last_point: Option<Point>,
}

impl RouteMetric for DistanceMetric {
    type Score = f64;
    fn next_sample(&mut self, sample: &LocationSample) {
        let point = sample.coordinate().point();
        self.total_distance += self
            .last_point
            .map_or(0.0, |prev| Haversine.distance(prev, point));
        self.last_point = Some(point);
    }

    fn finish(&mut self) -> f64 {
        self.total_distance
    }
}

#[derive(Debug, Clone, Default)]
struct DurationMetric {
    start_time: Option<OffsetDateTime>,
    end_time: Option<OffsetDateTime>,
}

impl RouteMetric for DurationMetric {
    type Score = f64;
    fn next_sample(&mut self, sample: &LocationSample) {
        if self.start_time.is_none() {
            self.start_time = Some(sample.timestamp);
        }
        self.end_time = Some(sample.timestamp);
    }

    fn finish(&mut self) -> f64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (end - start).as_seconds_f64(),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn sample(lat: f64, lon: f64, secs: i64) -> LocationSample {
        LocationSample::new(lat, lon, OffsetDateTime::UNIX_EPOCH + Duration::seconds(secs))
    }

    #[test]
    fn test_empty_and_single_point_routes() {
        assert_eq!(route_distance(&[]), 0.0);
        assert_eq!(route_distance(&[sample(40.0, -105.0, 0)]), 0.0);
        assert_eq!(score_route(&[]), RouteScores::default());
    }

    #[test]
    fn test_one_degree_latitude() {
        // ~111km for 1 degree of latitude
        let dist = route_distance(&[sample(0.0, 0.0, 0), sample(1.0, 0.0, 60)]);
        assert!((dist - 111_000.0).abs() < 1000.0);
    }

    #[test]
    fn test_distance_is_sum_of_legs() {
        let route = [
            sample(40.0, -105.0, 0),
            sample(40.001, -105.0, 10),
            sample(40.001, -105.001, 20),
            sample(40.002, -105.001, 30),
        ];

        let legs: f64 = route
            .windows(2)
            .map(|pair| route_distance(pair))
            .sum();

        let total = route_distance(&route);
        assert!((total - legs).abs() < 1e-9);
        assert_eq!(total, route_distance(&route));
    }

    #[test]
    fn test_duration() {
        let scores = score_route(&[sample(40.0, -105.0, 0), sample(40.001, -105.0, 90)]);
        assert_eq!(scores.duration, 90.0);
        assert!(scores.distance > 100.0);
    }
}
