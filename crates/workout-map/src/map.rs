//! Route overlays on a map surface.
//!
//! The presenter owns the route overlays it draws and nothing else. Whenever
//! the workout list changes it drops its overlays and redraws one
//! multi-line overlay per activity type.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use uuid::Uuid;

use crate::models::{ActivityType, Color, Coordinate, Region, Workout};

pub type OverlayId = u64;

/// All routes of one activity type, drawn as a single overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay {
    pub activity_type: ActivityType,
    pub color: Color,
    pub paths: Vec<Vec<Coordinate>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Route(RouteOverlay),
    Marker { coordinate: Coordinate, title: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub stroke_color: Color,
    pub line_width: f64,
    pub alpha: f64,
}

/// The map control the presenter draws on.
pub trait MapSurface: Send {
    fn region(&self) -> Region;
    fn set_region(&mut self, region: Region);
    fn overlays(&self) -> Vec<(OverlayId, &Overlay)>;
    fn add_overlay(&mut self, overlay: Overlay) -> OverlayId;
    fn remove_overlays(&mut self, ids: &[OverlayId]);
}

/// In-process map surface. Keeps overlays in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SceneMap {
    region: Region,
    overlays: BTreeMap<OverlayId, Overlay>,
    next_id: OverlayId,
}

impl SceneMap {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            ..Default::default()
        }
    }
}

impl MapSurface for SceneMap {
    fn region(&self) -> Region {
        self.region
    }

    fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    fn overlays(&self) -> Vec<(OverlayId, &Overlay)> {
        self.overlays.iter().map(|(id, o)| (*id, o)).collect()
    }

    fn add_overlay(&mut self, overlay: Overlay) -> OverlayId {
        let id = self.next_id;
        self.next_id += 1;
        self.overlays.insert(id, overlay);
        id
    }

    fn remove_overlays(&mut self, ids: &[OverlayId]) {
        for id in ids {
            self.overlays.remove(id);
        }
    }
}

pub struct MapPresenter<S> {
    surface: S,
    line_width: f64,
    drawn: Option<Vec<Uuid>>,
}

impl<S: MapSurface> MapPresenter<S> {
    pub const DEFAULT_LINE_WIDTH: f64 = 5.0;

    pub fn new(surface: S) -> Self {
        Self {
            surface,
            line_width: Self::DEFAULT_LINE_WIDTH,
            drawn: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Recenters on `region` if it moved, and redraws the routes if the
    /// workout list differs from the last one drawn. Returns whether the
    /// routes were redrawn.
    pub fn update(&mut self, region: Region, workouts: &[Arc<Workout>]) -> bool {
        if self.surface.region() != region {
            self.surface.set_region(region);
        }

        let ids: Vec<Uuid> = workouts.iter().map(|w| w.id()).collect();
        if self.drawn.as_ref() == Some(&ids) {
            return false;
        }

        let owned: Vec<OverlayId> = self
            .surface
            .overlays()
            .into_iter()
            .filter(|(_, overlay)| matches!(overlay, Overlay::Route(_)))
            .map(|(id, _)| id)
            .collect();
        self.surface.remove_overlays(&owned);

        for overlay in group_routes(workouts) {
            self.surface.add_overlay(Overlay::Route(overlay));
        }

        tracing::debug!("Redrew routes for {} workouts", ids.len());
        self.drawn = Some(ids);
        true
    }

    /// Style for an overlay the surface is about to render. `None` for
    /// overlays this presenter does not own.
    pub fn style_for(&self, overlay: &Overlay) -> Option<OverlayStyle> {
        match overlay {
            Overlay::Route(route) => Some(OverlayStyle {
                stroke_color: route.color,
                line_width: self.line_width,
                alpha: 1.0,
            }),
            Overlay::Marker { .. } => None,
        }
    }

    /// The surface's overlays as GeoJSON, route styles in the properties.
    pub fn feature_collection(&self) -> FeatureCollection {
        let features = self
            .surface
            .overlays()
            .into_iter()
            .map(|(id, overlay)| {
                let mut properties = JsonObject::new();
                properties.insert("overlay_id".to_string(), json!(id));

                let geometry = match overlay {
                    Overlay::Route(route) => {
                        properties.insert("kind".to_string(), json!("route"));
                        properties.insert("activity_type".to_string(), json!(route.activity_type));
                        if let Some(style) = self.style_for(overlay) {
                            properties.insert("color".to_string(), json!(style.stroke_color.hex()));
                            properties.insert("stroke_width".to_string(), json!(style.line_width));
                            properties.insert("alpha".to_string(), json!(style.alpha));
                        }
                        Value::MultiLineString(
                            route
                                .paths
                                .iter()
                                .map(|path| {
                                    path.iter().map(|c| vec![c.longitude, c.latitude]).collect()
                                })
                                .collect(),
                        )
                    }
                    Overlay::Marker { coordinate, title } => {
                        properties.insert("kind".to_string(), json!("marker"));
                        properties.insert("title".to_string(), json!(title));
                        Value::Point(vec![coordinate.longitude, coordinate.latitude])
                    }
                };

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geometry)),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

/// Groups workout routes by type, in type order. Routes with fewer than two
/// samples cannot be drawn and are left out; types with nothing to draw get
/// no overlay.
pub fn group_routes(workouts: &[Arc<Workout>]) -> Vec<RouteOverlay> {
    let mut grouped: BTreeMap<ActivityType, Vec<Vec<Coordinate>>> = BTreeMap::new();
    let mut seen = HashSet::new();

    for workout in workouts {
        if !seen.insert(workout.id()) || workout.route().len() < 2 {
            continue;
        }
        grouped
            .entry(workout.activity_type())
            .or_default()
            .push(workout.route().iter().map(|s| s.coordinate()).collect());
    }

    grouped
        .into_iter()
        .map(|(activity_type, paths)| RouteOverlay {
            activity_type,
            color: activity_type.color(),
            paths,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationSample;
    use time::{Duration, OffsetDateTime};

    fn workout(activity_type: ActivityType, points: usize) -> Arc<Workout> {
        let t0 = OffsetDateTime::UNIX_EPOCH;
        let route = (0..points)
            .map(|i| LocationSample::new(44.6 + i as f64 * 0.001, -63.6, t0 + Duration::seconds(i as i64)))
            .collect();
        Arc::new(Workout::new(Uuid::new_v4(), t0, t0, activity_type, route))
    }

    fn route_overlays(surface: &SceneMap) -> Vec<RouteOverlay> {
        surface
            .overlays()
            .into_iter()
            .filter_map(|(_, o)| match o {
                Overlay::Route(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_one_overlay_per_type() {
        let workouts = vec![
            workout(ActivityType::Running, 3),
            workout(ActivityType::Cycling, 3),
            workout(ActivityType::Running, 4),
        ];
        let mut presenter = MapPresenter::new(SceneMap::default());

        assert!(presenter.update(Region::default(), &workouts));

        let overlays = route_overlays(presenter.surface());
        assert_eq!(overlays.len(), 2);
        let running = overlays
            .iter()
            .find(|o| o.activity_type == ActivityType::Running)
            .unwrap();
        assert_eq!(running.paths.len(), 2);
        assert_eq!(running.color, Color::Red);
    }

    #[test]
    fn test_redraw_replaces_routes_but_keeps_markers() {
        let mut presenter = MapPresenter::new(SceneMap::default());
        presenter.surface_mut().add_overlay(Overlay::Marker {
            coordinate: Coordinate::new(44.6, -63.6),
            title: "Current location".to_string(),
        });

        let mut workouts = vec![workout(ActivityType::Walking, 3)];
        presenter.update(Region::default(), &workouts);
        workouts.push(workout(ActivityType::Walking, 3));
        assert!(presenter.update(Region::default(), &workouts));

        let overlays = presenter.surface().overlays();
        assert_eq!(overlays.len(), 2);
        assert_eq!(route_overlays(presenter.surface())[0].paths.len(), 2);
        assert!(
            overlays
                .iter()
                .any(|(_, o)| matches!(o, Overlay::Marker { .. }))
        );
    }

    #[test]
    fn test_region_change_does_not_redraw() {
        let workouts = vec![workout(ActivityType::Cycling, 3)];
        let mut presenter = MapPresenter::new(SceneMap::default());
        presenter.update(Region::default(), &workouts);

        let moved = Region::default().recentered(Coordinate::new(40.0, -105.0));
        assert!(!presenter.update(moved, &workouts));
        assert_eq!(presenter.surface().region(), moved);
    }

    #[test]
    fn test_short_routes_are_skipped() {
        let workouts = vec![workout(ActivityType::Running, 1)];
        assert!(group_routes(&workouts).is_empty());
    }

    #[test]
    fn test_route_style() {
        let presenter = MapPresenter::new(SceneMap::default());
        let overlay = Overlay::Route(RouteOverlay {
            activity_type: ActivityType::Cycling,
            color: Color::Green,
            paths: Vec::new(),
        });

        let style = presenter.style_for(&overlay).unwrap();
        assert_eq!(style.line_width, 5.0);
        assert_eq!(style.alpha, 1.0);
        assert_eq!(style.stroke_color, Color::Green);

        let marker = Overlay::Marker {
            coordinate: Coordinate::new(0.0, 0.0),
            title: String::new(),
        };
        assert_eq!(presenter.style_for(&marker), None);
    }

    #[test]
    fn test_feature_collection() {
        let workouts = vec![workout(ActivityType::Running, 3)];
        let mut presenter = MapPresenter::new(SceneMap::default());
        presenter.update(Region::default(), &workouts);

        let collection = presenter.feature_collection();
        assert_eq!(collection.features.len(), 1);

        let feature = &collection.features[0];
        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["activity_type"], json!("running"));
        assert_eq!(properties["color"], json!("#ff3b30"));
        assert!(matches!(
            feature.geometry.as_ref().map(|g| &g.value),
            Some(Value::MultiLineString(lines)) if lines.len() == 1 && lines[0].len() == 3
        ));
    }
}
