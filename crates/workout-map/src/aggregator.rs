//! Workout fetch pipeline.
//!
//! One fetch cycle: authorize, query workout records, then load every new
//! workout in its own task (routes, paged location batches, merge, sort) and
//! append it to the published snapshot as soon as it is complete.
//!
//! The cycle's coordinator task is the only writer of the snapshot. Workout
//! tasks hand back finished values and never touch shared state.

use std::{
    collections::{BTreeSet, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use enum_map::EnumMap;
use futures::future::try_join_all;
use tokio::{sync::watch, task::JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    errors::AppError,
    health::{HealthError, HealthStore, RouteRecord, WorkoutRecord},
    models::{ActivityType, LocationSample, Workout},
};

/// Bookkeeping for the current (or last) fetch cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleProgress {
    pub requested: BTreeSet<ActivityType>,
    /// `None` until the workout query has answered.
    pub discovered: Option<usize>,
    pub completed: usize,
    pub failed: usize,
    pub discovered_by_type: EnumMap<ActivityType, usize>,
    pub completed_by_type: EnumMap<ActivityType, usize>,
    pub finished: bool,
}

impl CycleProgress {
    fn new(requested: BTreeSet<ActivityType>) -> Self {
        Self {
            requested,
            ..Default::default()
        }
    }

    /// `completed / discovered`, or `None` while discovery is pending.
    pub fn fraction(&self) -> Option<f64> {
        self.discovered.map(|discovered| {
            if discovered == 0 {
                1.0
            } else {
                self.completed as f64 / discovered as f64
            }
        })
    }

    /// Whether workouts of this type may still arrive in this cycle.
    pub fn is_type_loading(&self, activity_type: ActivityType) -> bool {
        if self.finished {
            return false;
        }
        match self.discovered {
            None => self.requested.contains(&activity_type),
            Some(_) => {
                self.completed_by_type[activity_type] < self.discovered_by_type[activity_type]
            }
        }
    }
}

/// Everything the aggregator publishes.
#[derive(Debug, Clone, Default)]
pub struct AggregatorSnapshot {
    /// Completed workouts in arrival order, across all cycles.
    pub workouts: Vec<Arc<Workout>>,
    /// `None` before the first fetch.
    pub cycle: Option<CycleProgress>,
}

impl AggregatorSnapshot {
    pub fn progress(&self) -> Option<f64> {
        self.cycle.as_ref().and_then(CycleProgress::fraction)
    }

    pub fn is_in_flight(&self) -> bool {
        self.cycle.as_ref().is_some_and(|c| !c.finished)
    }

    pub fn is_type_loading(&self, activity_type: ActivityType) -> bool {
        self.cycle
            .as_ref()
            .is_some_and(|c| c.is_type_loading(activity_type))
    }

    pub fn total_distance(&self) -> f64 {
        self.workouts.iter().map(|w| w.distance_meters()).sum()
    }

    pub fn distance_by_type(&self) -> EnumMap<ActivityType, f64> {
        let mut totals = EnumMap::default();
        for workout in &self.workouts {
            totals[workout.activity_type()] += workout.distance_meters();
        }
        totals
    }
}

/// Clears the in-flight flag when released, or when dropped by a task that
/// never got that far.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
    armed: bool,
}

impl InFlightGuard {
    fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag, armed: true }
    }

    fn release(mut self) {
        self.armed = false;
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(false, Ordering::SeqCst);
        }
    }
}

#[derive(Clone)]
pub struct WorkoutAggregator {
    store: Arc<dyn HealthStore>,
    state: Arc<watch::Sender<AggregatorSnapshot>>,
    in_flight: Arc<AtomicBool>,
}

impl WorkoutAggregator {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        let (state, _rx) = watch::channel(AggregatorSnapshot::default());
        Self {
            store,
            state: Arc::new(state),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregatorSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AggregatorSnapshot {
        self.state.borrow().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Starts a fetch cycle for `requested_types` in the background.
    ///
    /// Fails with [`AppError::FetchInFlight`] while a previous cycle runs.
    pub fn fetch(
        &self,
        requested_types: BTreeSet<ActivityType>,
    ) -> Result<tokio::task::JoinHandle<()>, AppError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Ignoring fetch request, a cycle is already in flight");
            return Err(AppError::FetchInFlight);
        }
        let guard = InFlightGuard::new(self.in_flight.clone());

        self.state
            .send_modify(|s| s.cycle = Some(CycleProgress::new(requested_types.clone())));

        let store = self.store.clone();
        let state = self.state.clone();
        Ok(tokio::spawn(async move {
            run_cycle(store, &state, requested_types).await;
            // Readers must never see a finished cycle while fetch still refuses.
            state.send_modify(move |s| {
                if let Some(cycle) = s.cycle.as_mut() {
                    cycle.finished = true;
                }
                guard.release();
            });
        }))
    }
}

async fn run_cycle(
    store: Arc<dyn HealthStore>,
    state: &watch::Sender<AggregatorSnapshot>,
    requested: BTreeSet<ActivityType>,
) {
    info!("Requesting authorization...");
    match store.request_authorization().await {
        Ok(true) => info!("Authorization requested successfully."),
        Ok(false) => {
            warn!("Workout read access was declined.");
            record_discovered(state, &[], &HashSet::new());
            return;
        }
        Err(e) => {
            error!("Authorization request failed: {e}");
            record_discovered(state, &[], &HashSet::new());
            return;
        }
    }

    info!("Querying workouts...");
    let records = match store.query_workouts(&requested).await {
        Ok(records) => {
            info!("Successfully queried {} workouts.", records.len());
            records
        }
        Err(HealthError::MalformedResult(msg)) => {
            warn!("Workouts failed to be retrieved: {msg}");
            Vec::new()
        }
        Err(e) => {
            error!("Error while querying workouts: {e}");
            Vec::new()
        }
    };

    let known: HashSet<Uuid> = state.borrow().workouts.iter().map(|w| w.id()).collect();
    record_discovered(state, &records, &known);

    let mut tasks = JoinSet::new();
    for record in records.into_iter().filter(|r| !known.contains(&r.id)) {
        let store = store.clone();
        tasks.spawn(async move {
            let id = record.id;
            (id, load_workout(store.as_ref(), record).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(workout))) => {
                let activity_type = workout.activity_type();
                state.send_modify(|s| {
                    s.workouts.push(Arc::new(workout));
                    if let Some(cycle) = s.cycle.as_mut() {
                        cycle.completed += 1;
                        cycle.completed_by_type[activity_type] += 1;
                    }
                });
            }
            Ok((id, Err(e))) => {
                error!("Dropping workout {id}: {e}");
                mark_failed(state);
            }
            Err(e) => {
                error!("Workout task did not complete: {e}");
                mark_failed(state);
            }
        }
    }

    info!("Fetch cycle finished");
}

/// Records the discovered count. Workouts already published count as
/// completed straight away.
fn record_discovered(
    state: &watch::Sender<AggregatorSnapshot>,
    records: &[WorkoutRecord],
    known: &HashSet<Uuid>,
) {
    state.send_modify(|s| {
        let cycle = s.cycle.get_or_insert_with(CycleProgress::default);
        cycle.discovered = Some(records.len());
        for record in records {
            cycle.discovered_by_type[record.activity_type] += 1;
            if known.contains(&record.id) {
                cycle.completed += 1;
                cycle.completed_by_type[record.activity_type] += 1;
            }
        }
    });
}

fn mark_failed(state: &watch::Sender<AggregatorSnapshot>) {
    state.send_modify(|s| {
        if let Some(cycle) = s.cycle.as_mut() {
            cycle.failed += 1;
        }
    });
}

/// Reads every route of a workout and merges them into one sorted route.
async fn load_workout(
    store: &dyn HealthStore,
    record: WorkoutRecord,
) -> Result<Workout, HealthError> {
    debug!("Querying workout routes for {}...", record.id);
    let routes = store.query_routes(&record).await?;
    debug!("Successfully queried {} routes!", routes.len());

    let chunks = try_join_all(routes.iter().map(|route| route_samples(store, route))).await?;
    let samples: Vec<LocationSample> = chunks.into_iter().flatten().collect();

    Ok(Workout::new(
        record.id,
        record.start,
        record.end,
        record.activity_type,
        samples,
    ))
}

/// Pages through one route until the store marks a batch final.
async fn route_samples(
    store: &dyn HealthStore,
    route: &RouteRecord,
) -> Result<Vec<LocationSample>, HealthError> {
    let mut samples = Vec::new();

    for page in 0usize.. {
        match store.route_locations(route, page).await {
            Ok(batch) => {
                samples.extend(batch.samples);
                if batch.is_final {
                    debug!("Finished querying {} locations!", samples.len());
                    break;
                }
            }
            Err(HealthError::MalformedResult(msg)) => {
                warn!("Route failed to be retrieved: {msg}");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::InMemoryHealthStore;
    use time::{Duration, OffsetDateTime};

    fn route(start_secs: i64, count: usize) -> Vec<LocationSample> {
        (0..count)
            .map(|i| {
                let secs = start_secs + i as i64 * 10;
                LocationSample::new(
                    44.6 + secs as f64 * 0.0001,
                    -63.6,
                    OffsetDateTime::UNIX_EPOCH + Duration::seconds(secs),
                )
            })
            .collect()
    }

    #[test]
    fn test_progress_fraction() {
        let mut cycle = CycleProgress::new(BTreeSet::from([ActivityType::Running]));
        assert_eq!(cycle.fraction(), None);
        assert!(cycle.is_type_loading(ActivityType::Running));
        assert!(!cycle.is_type_loading(ActivityType::Cycling));

        cycle.discovered = Some(0);
        assert_eq!(cycle.fraction(), Some(1.0));

        cycle.discovered = Some(4);
        cycle.completed = 1;
        assert_eq!(cycle.fraction(), Some(0.25));
    }

    #[tokio::test]
    async fn test_merges_chunked_routes_in_time_order() {
        let mut store = InMemoryHealthStore::new(3);
        // Chunks recorded out of order relative to each other
        store.add_workout(
            ActivityType::Running,
            vec![route(100, 5), route(0, 5), route(50, 4)],
        );

        let aggregator = WorkoutAggregator::new(Arc::new(store));
        aggregator
            .fetch(BTreeSet::from([ActivityType::Running]))
            .unwrap()
            .await
            .unwrap();

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.workouts.len(), 1);

        let workout = &snapshot.workouts[0];
        assert_eq!(workout.route().len(), 14);
        assert!(
            workout
                .route()
                .windows(2)
                .all(|pair| pair[0].timestamp <= pair[1].timestamp)
        );
        assert_eq!(snapshot.progress(), Some(1.0));
        assert!(!aggregator.is_in_flight());
    }

    #[tokio::test]
    async fn test_workout_without_routes_is_published_empty() {
        let mut store = InMemoryHealthStore::default();
        store.add_workout(ActivityType::Walking, Vec::new());

        let aggregator = WorkoutAggregator::new(Arc::new(store));
        aggregator
            .fetch(BTreeSet::from([ActivityType::Walking]))
            .unwrap()
            .await
            .unwrap();

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.workouts.len(), 1);
        assert!(snapshot.workouts[0].route().is_empty());
        assert_eq!(snapshot.total_distance(), 0.0);
    }

    #[tokio::test]
    async fn test_malformed_batch_is_treated_as_empty() {
        let mut store = InMemoryHealthStore::default();
        let id = store.add_workout(ActivityType::Cycling, vec![route(0, 5)]);
        store.malformed_locations_for(id);

        let aggregator = WorkoutAggregator::new(Arc::new(store));
        aggregator
            .fetch(BTreeSet::from([ActivityType::Cycling]))
            .unwrap()
            .await
            .unwrap();

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.workouts.len(), 1);
        assert!(snapshot.workouts[0].route().is_empty());
    }

    #[tokio::test]
    async fn test_distance_by_type() {
        let mut store = InMemoryHealthStore::default();
        store.add_workout(ActivityType::Running, vec![route(0, 5)]);
        store.add_workout(ActivityType::Cycling, vec![route(0, 10)]);

        let aggregator = WorkoutAggregator::new(Arc::new(store));
        aggregator
            .fetch(BTreeSet::from([ActivityType::Running, ActivityType::Cycling]))
            .unwrap()
            .await
            .unwrap();

        let snapshot = aggregator.snapshot();
        let by_type = snapshot.distance_by_type();
        assert!(by_type[ActivityType::Cycling] > by_type[ActivityType::Running]);
        assert_eq!(by_type[ActivityType::Walking], 0.0);
        let sum: f64 = by_type.values().sum();
        assert!((sum - snapshot.total_distance()).abs() < 1e-9);
    }
}
