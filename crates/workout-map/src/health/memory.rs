use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::watch;
use uuid::Uuid;

use super::{HealthError, HealthStore, LocationBatch, RouteRecord, WorkoutRecord};
use crate::models::{ActivityType, LocationSample};

/// How the store answers authorization requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Authorization {
    #[default]
    Granted,
    Declined,
    Fails,
}

#[derive(Debug, Clone)]
struct StoredRoute {
    record: RouteRecord,
    samples: Vec<LocationSample>,
}

#[derive(Debug, Clone)]
struct StoredWorkout {
    record: WorkoutRecord,
    routes: Vec<StoredRoute>,
}

/// Holds route reads until released. Dropping the gate releases it too.
#[derive(Debug)]
pub struct RouteGate {
    tx: watch::Sender<bool>,
}

impl RouteGate {
    pub fn release(&self) {
        self.tx.send_replace(true);
    }
}

/// Health store backed by workouts held in memory.
#[derive(Debug)]
pub struct InMemoryHealthStore {
    authorization: Authorization,
    workouts: Vec<StoredWorkout>,
    routes: HashMap<Uuid, (usize, usize)>,
    batch_size: usize,
    fail_workout_query: bool,
    failing_workouts: HashSet<Uuid>,
    malformed_routes: HashSet<Uuid>,
    gate: Option<watch::Receiver<bool>>,
    route_queries: AtomicUsize,
}

impl Default for InMemoryHealthStore {
    fn default() -> Self {
        Self::new(InMemoryHealthStore::DEFAULT_BATCH_SIZE)
    }
}

impl InMemoryHealthStore {
    pub const DEFAULT_BATCH_SIZE: usize = 200;

    pub fn new(batch_size: usize) -> Self {
        Self {
            authorization: Authorization::Granted,
            workouts: Vec::new(),
            routes: HashMap::new(),
            batch_size: batch_size.max(1),
            fail_workout_query: false,
            failing_workouts: HashSet::new(),
            malformed_routes: HashSet::new(),
            gate: None,
            route_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = authorization;
        self
    }

    /// Makes the workout query itself fail.
    pub fn with_failing_workout_query(mut self) -> Self {
        self.fail_workout_query = true;
        self
    }

    /// Holds every route query until the returned gate is released.
    pub fn gated(mut self) -> (Self, RouteGate) {
        let (tx, rx) = watch::channel(false);
        self.gate = Some(rx);
        (self, RouteGate { tx })
    }

    /// Adds a workout whose route was recorded as `routes`, one entry per
    /// route object. Start and end come from the earliest and latest sample.
    pub fn add_workout(
        &mut self,
        activity_type: ActivityType,
        routes: Vec<Vec<LocationSample>>,
    ) -> Uuid {
        let times = routes.iter().flatten().map(|s| s.timestamp);
        let start = times.clone().min().unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let end = times.max().unwrap_or(start);
        self.add_workout_record(
            WorkoutRecord {
                id: Uuid::new_v4(),
                start,
                end,
                activity_type,
            },
            routes,
        )
    }

    pub fn add_workout_record(
        &mut self,
        record: WorkoutRecord,
        routes: Vec<Vec<LocationSample>>,
    ) -> Uuid {
        let workout_index = self.workouts.len();
        let routes = routes
            .into_iter()
            .enumerate()
            .map(|(route_index, samples)| {
                let record = RouteRecord {
                    id: Uuid::new_v4(),
                    workout_id: record.id,
                };
                self.routes.insert(record.id, (workout_index, route_index));
                StoredRoute { record, samples }
            })
            .collect();

        let id = record.id;
        self.workouts.push(StoredWorkout { record, routes });
        id
    }

    /// Route queries for this workout fail.
    pub fn fail_routes_for(&mut self, workout_id: Uuid) {
        self.failing_workouts.insert(workout_id);
    }

    /// Location pages of this workout's routes come back malformed.
    pub fn malformed_locations_for(&mut self, workout_id: Uuid) {
        self.malformed_routes.insert(workout_id);
    }

    pub fn workout_count(&self) -> usize {
        self.workouts.len()
    }

    /// How many route queries have been answered or attempted.
    pub fn route_queries(&self) -> usize {
        self.route_queries.load(Ordering::SeqCst)
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            let mut gate = gate.clone();
            // A dropped gate counts as released.
            let _ = gate.wait_for(|open| *open).await;
        }
    }
}

#[async_trait]
impl HealthStore for InMemoryHealthStore {
    async fn request_authorization(&self) -> Result<bool, HealthError> {
        match self.authorization {
            Authorization::Granted => Ok(true),
            Authorization::Declined => Ok(false),
            Authorization::Fails => Err(HealthError::AuthorizationDenied),
        }
    }

    async fn query_workouts(
        &self,
        types: &BTreeSet<ActivityType>,
    ) -> Result<Vec<WorkoutRecord>, HealthError> {
        if self.fail_workout_query {
            return Err(HealthError::QueryFailed(
                "workout query rejected by store".to_string(),
            ));
        }

        Ok(self
            .workouts
            .iter()
            .filter(|w| types.contains(&w.record.activity_type))
            .map(|w| w.record.clone())
            .collect())
    }

    async fn query_routes(&self, workout: &WorkoutRecord) -> Result<Vec<RouteRecord>, HealthError> {
        self.route_queries.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;

        if self.failing_workouts.contains(&workout.id) {
            return Err(HealthError::QueryFailed(format!(
                "routes for workout {} unavailable",
                workout.id
            )));
        }

        let stored = self
            .workouts
            .iter()
            .find(|w| w.record.id == workout.id)
            .ok_or_else(|| HealthError::QueryFailed(format!("unknown workout {}", workout.id)))?;

        // Newest chunk first, the way chunked recordings tend to come back.
        Ok(stored.routes.iter().rev().map(|r| r.record).collect())
    }

    async fn route_locations(
        &self,
        route: &RouteRecord,
        page: usize,
    ) -> Result<LocationBatch, HealthError> {
        if self.malformed_routes.contains(&route.workout_id) {
            return Err(HealthError::MalformedResult(format!(
                "route {} returned no location list",
                route.id
            )));
        }

        let &(workout_index, route_index) = self
            .routes
            .get(&route.id)
            .ok_or_else(|| HealthError::QueryFailed(format!("unknown route {}", route.id)))?;
        let samples = &self.workouts[workout_index].routes[route_index].samples;

        let start = (page * self.batch_size).min(samples.len());
        let end = (start + self.batch_size).min(samples.len());

        Ok(LocationBatch {
            samples: samples[start..end].to_vec(),
            is_final: end >= samples.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn samples(count: usize) -> Vec<LocationSample> {
        (0..count)
            .map(|i| {
                LocationSample::new(
                    44.0 + i as f64 * 0.001,
                    -63.0,
                    OffsetDateTime::UNIX_EPOCH + Duration::seconds(i as i64),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_filters_by_type() {
        let mut store = InMemoryHealthStore::default();
        store.add_workout(ActivityType::Running, vec![samples(3)]);
        store.add_workout(ActivityType::Cycling, vec![samples(3)]);

        let running = store
            .query_workouts(&BTreeSet::from([ActivityType::Running]))
            .await
            .unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].activity_type, ActivityType::Running);
    }

    #[tokio::test]
    async fn test_pages_until_final() {
        let mut store = InMemoryHealthStore::new(2);
        let id = store.add_workout(ActivityType::Walking, vec![samples(5)]);
        let record = store
            .query_workouts(&BTreeSet::from([ActivityType::Walking]))
            .await
            .unwrap()
            .remove(0);
        assert_eq!(record.id, id);

        let route = store.query_routes(&record).await.unwrap()[0];
        let pages: Vec<LocationBatch> = futures::future::join_all(
            (0..3).map(|page| store.route_locations(&route, page)),
        )
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

        assert_eq!(pages[0].samples.len(), 2);
        assert!(!pages[0].is_final);
        assert_eq!(pages[2].samples.len(), 1);
        assert!(pages[2].is_final);
    }

    #[tokio::test]
    async fn test_empty_route_is_single_final_page() {
        let mut store = InMemoryHealthStore::default();
        store.add_workout(ActivityType::Walking, vec![Vec::new()]);
        let record = store
            .query_workouts(&BTreeSet::from([ActivityType::Walking]))
            .await
            .unwrap()
            .remove(0);
        let route = store.query_routes(&record).await.unwrap()[0];

        let batch = store.route_locations(&route, 0).await.unwrap();
        assert!(batch.samples.is_empty());
        assert!(batch.is_final);
    }

    #[tokio::test]
    async fn test_authorization_modes() {
        let declined = InMemoryHealthStore::default().with_authorization(Authorization::Declined);
        assert_eq!(declined.request_authorization().await, Ok(false));

        let failing = InMemoryHealthStore::default().with_authorization(Authorization::Fails);
        assert_eq!(
            failing.request_authorization().await,
            Err(HealthError::AuthorizationDenied)
        );
    }
}
