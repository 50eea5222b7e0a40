//! Health-data service contract and its backends.
//!
//! The aggregator only talks to [`HealthStore`]. Two backends exist:
//! - [`InMemoryHealthStore`]: workouts held in memory, with switches for
//!   declined authorization, failing queries and gated route reads
//! - [`GpxLoader`]: fills an in-memory store from a directory of GPX files

mod gpx_files;
mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{ActivityType, LocationSample};

pub use gpx_files::{GpxError, GpxLoader};
pub use memory::{Authorization, InMemoryHealthStore, RouteGate};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HealthError {
    #[error("read authorization was denied")]
    AuthorizationDenied,

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("malformed result: {0}")]
    MalformedResult(String),
}

/// A workout as the store reports it, before any route data is read.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub activity_type: ActivityType,
}

/// One recorded route object of a workout. Route recording can be chunked,
/// so a workout may own any number of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteRecord {
    pub id: Uuid,
    pub workout_id: Uuid,
}

/// One page of location samples for a route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationBatch {
    pub samples: Vec<LocationSample>,
    /// Set on the last page of the route.
    pub is_final: bool,
}

#[async_trait]
pub trait HealthStore: Send + Sync {
    /// Asks for read access to workouts and their routes.
    ///
    /// `Ok(false)` means the user declined.
    async fn request_authorization(&self) -> Result<bool, HealthError>;

    /// Every workout whose type is in `types`, with no upper bound.
    async fn query_workouts(
        &self,
        types: &BTreeSet<ActivityType>,
    ) -> Result<Vec<WorkoutRecord>, HealthError>;

    /// Route objects belonging to `workout`, possibly none.
    async fn query_routes(&self, workout: &WorkoutRecord) -> Result<Vec<RouteRecord>, HealthError>;

    /// Page `page` (zero based) of the samples of `route`.
    async fn route_locations(
        &self,
        route: &RouteRecord,
        page: usize,
    ) -> Result<LocationBatch, HealthError>;
}
