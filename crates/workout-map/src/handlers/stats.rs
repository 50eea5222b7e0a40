//! Health check and workout statistics handlers.

use axum::{Extension, http::StatusCode, response::Json};
use serde::Serialize;

use super::SharedScreen;
use crate::models::ActivityType;

/// Health check endpoint.
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct TypeStats {
    pub activity_type: ActivityType,
    pub workouts: usize,
    pub distance_meters: f64,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub workouts: usize,
    pub total_distance_meters: f64,
    pub progress: Option<f64>,
    pub in_flight: bool,
    pub failed: usize,
    pub by_type: Vec<TypeStats>,
}

/// Raw aggregate numbers across everything fetched so far, ignoring the filter.
pub async fn get_stats(Extension(screen): Extension<SharedScreen>) -> Json<Stats> {
    let snapshot = screen.lock().await.aggregator().snapshot();
    let distances = snapshot.distance_by_type();

    let by_type = ActivityType::ALL
        .into_iter()
        .map(|activity_type| TypeStats {
            activity_type,
            workouts: snapshot
                .workouts
                .iter()
                .filter(|w| w.activity_type() == activity_type)
                .count(),
            distance_meters: distances[activity_type],
        })
        .collect();

    Json(Stats {
        workouts: snapshot.workouts.len(),
        total_distance_meters: snapshot.total_distance(),
        progress: snapshot.progress(),
        in_flight: snapshot.is_in_flight(),
        failed: snapshot.cycle.as_ref().map_or(0, |c| c.failed),
        by_type,
    })
}
