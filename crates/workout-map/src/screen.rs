//! The map screen: map, loading indicator, distance legend and type filter.
//!
//! `MapScreen` is a headless view model. `render` folds the latest published
//! workouts and location into a [`ScreenState`] that a frontend draws as is.

use std::{collections::BTreeSet, sync::Arc};

use geojson::FeatureCollection;
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::{
    aggregator::{AggregatorSnapshot, WorkoutAggregator},
    location::LocationWatcher,
    map::{MapPresenter, MapSurface, Overlay, OverlayId, SceneMap},
    models::{ActivityType, Coordinate, Region, Workout},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadingIndicator {
    pub visible: bool,
    /// `None` while the amount of work is still unknown.
    pub progress: Option<f64>,
}

/// A label with a value that may still be computing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledCalculation {
    pub label: String,
    pub loading: bool,
    /// Absent while loading.
    pub value: Option<String>,
}

impl LabeledCalculation {
    fn new(label: impl Into<String>, loading: bool, meters: f64) -> Self {
        Self {
            label: label.into(),
            loading,
            value: (!loading).then(|| format_distance(meters)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub activity_type: ActivityType,
    pub icon: Option<&'static str>,
    pub color: &'static str,
    pub distance: LabeledCalculation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub total: LabeledCalculation,
    pub types: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterEntry {
    pub activity_type: ActivityType,
    pub name: &'static str,
    pub icon: Option<&'static str>,
    pub color: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenState {
    pub region: Region,
    pub loading: LoadingIndicator,
    pub legend: Legend,
    pub filter: Vec<FilterEntry>,
    pub workout_count: usize,
}

pub struct MapScreen {
    selected: BTreeSet<ActivityType>,
    aggregator: WorkoutAggregator,
    watcher: LocationWatcher,
    location_rx: watch::Receiver<Option<Coordinate>>,
    presenter: MapPresenter<SceneMap>,
    region: Region,
    location_marker: Option<OverlayId>,
    refetch_queued: bool,
}

impl MapScreen {
    pub fn new(
        aggregator: WorkoutAggregator,
        watcher: LocationWatcher,
        selected: BTreeSet<ActivityType>,
        region: Region,
    ) -> Self {
        let location_rx = watcher.subscribe();
        Self {
            selected,
            aggregator,
            watcher,
            location_rx,
            presenter: MapPresenter::new(SceneMap::new(region)),
            region,
            location_marker: None,
            refetch_queued: false,
        }
    }

    pub fn selected(&self) -> &BTreeSet<ActivityType> {
        &self.selected
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn aggregator(&self) -> &WorkoutAggregator {
        &self.aggregator
    }

    pub fn is_refetch_queued(&self) -> bool {
        self.refetch_queued
    }

    /// First appearance: ask for the location once and load workouts.
    pub fn appear(&mut self) {
        self.request_location();
        self.request_fetch();
    }

    pub fn request_location(&mut self) {
        // The task publishes through the watcher; nothing to wait for here.
        let _ = self.watcher.request_once();
    }

    /// Flips `activity_type` in the filter and fetches with the new set.
    pub fn toggle(&mut self, activity_type: ActivityType) {
        if !self.selected.remove(&activity_type) {
            self.selected.insert(activity_type);
        }
        info!("Filter is now {:?}", self.selected);
        self.request_fetch();
    }

    fn request_fetch(&mut self) {
        match self.aggregator.fetch(self.selected.clone()) {
            Ok(_) => self.refetch_queued = false,
            Err(e) => {
                info!("Queueing fetch: {e}");
                self.refetch_queued = true;
            }
        }
    }

    /// Recenters on a newly published location fix and marks it.
    fn apply_location(&mut self) {
        if !self.location_rx.has_changed().unwrap_or(false) {
            return;
        }
        let Some(fix) = *self.location_rx.borrow_and_update() else {
            return;
        };

        self.region = self.region.recentered(fix);

        let surface = self.presenter.surface_mut();
        if let Some(marker) = self.location_marker.take() {
            surface.remove_overlays(&[marker]);
        }
        self.location_marker = Some(surface.add_overlay(Overlay::Marker {
            coordinate: fix,
            title: "Current location".to_string(),
        }));
    }

    pub fn render(&mut self) -> ScreenState {
        self.apply_location();

        if self.refetch_queued && !self.aggregator.is_in_flight() {
            self.request_fetch();
        }

        let snapshot = self.aggregator.snapshot();
        let visible: Vec<Arc<Workout>> = snapshot
            .workouts
            .iter()
            .filter(|w| self.selected.contains(&w.activity_type()))
            .cloned()
            .collect();
        self.presenter.update(self.region, &visible);

        let progress = snapshot.progress();
        let loading = LoadingIndicator {
            visible: snapshot.cycle.is_some() && progress.is_none_or(|p| p < 1.0),
            progress,
        };

        let by_type = snapshot.distance_by_type();
        let types: Vec<LegendEntry> = ActivityType::SELECTABLE
            .into_iter()
            .filter(|t| self.selected.contains(t))
            .map(|t| LegendEntry {
                activity_type: t,
                icon: t.icon(),
                color: t.color().hex(),
                distance: LabeledCalculation::new(
                    t.display_name(),
                    self.is_type_loading(&snapshot, t),
                    by_type[t],
                ),
            })
            .collect();

        let total_loading = self
            .selected
            .iter()
            .any(|t| self.is_type_loading(&snapshot, *t));
        let total_meters: f64 = visible.iter().map(|w| w.distance_meters()).sum();

        let filter = ActivityType::SELECTABLE
            .into_iter()
            .map(|t| FilterEntry {
                activity_type: t,
                name: t.display_name(),
                icon: t.icon(),
                color: t.color().hex(),
                selected: self.selected.contains(&t),
            })
            .collect();

        ScreenState {
            region: self.region,
            loading,
            legend: Legend {
                total: LabeledCalculation::new("Total distance", total_loading, total_meters),
                types,
            },
            filter,
            workout_count: visible.len(),
        }
    }

    /// A selected type is still loading while the running cycle may add to
    /// it, or while it waits for a queued fetch the running cycle never
    /// asked for.
    fn is_type_loading(
        &self,
        snapshot: &AggregatorSnapshot,
        activity_type: ActivityType,
    ) -> bool {
        if snapshot.is_type_loading(activity_type) {
            return true;
        }
        self.refetch_queued
            && snapshot
                .cycle
                .as_ref()
                .is_none_or(|c| !c.requested.contains(&activity_type))
    }

    pub fn geojson(&self) -> FeatureCollection {
        self.presenter.feature_collection()
    }
}

/// Formats a distance the way the legend shows it: whole meters below a
/// kilometer, otherwise kilometers with one decimal.
pub fn format_distance(meters: f64) -> String {
    let whole = meters.round();
    if whole < 1000.0 {
        format!("{} m", whole as i64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}
