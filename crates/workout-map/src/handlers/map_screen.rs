//! Screen rendering and user interaction handlers.

use axum::{Extension, extract::Path, http::StatusCode, response::Json};
use geojson::FeatureCollection;

use super::SharedScreen;
use crate::{errors::AppError, models::ActivityType, screen::ScreenState};

/// Current screen state: region, loading indicator, legend and filter.
pub async fn get_screen(Extension(screen): Extension<SharedScreen>) -> Json<ScreenState> {
    let mut screen = screen.lock().await;
    Json(screen.render())
}

/// Route and marker overlays as a GeoJSON feature collection.
pub async fn get_map_geojson(
    Extension(screen): Extension<SharedScreen>,
) -> Json<FeatureCollection> {
    let mut screen = screen.lock().await;
    screen.render();
    Json(screen.geojson())
}

/// Tap on a filter entry.
pub async fn toggle_filter(
    Extension(screen): Extension<SharedScreen>,
    Path(activity_type): Path<String>,
) -> Result<Json<ScreenState>, AppError> {
    let activity_type: ActivityType = activity_type.parse()?;
    if !ActivityType::SELECTABLE.contains(&activity_type) {
        return Err(AppError::InvalidInput(format!(
            "{activity_type} cannot be filtered"
        )));
    }

    let mut screen = screen.lock().await;
    screen.toggle(activity_type);
    Ok(Json(screen.render()))
}

/// Asks for the device location once; the screen recenters when it arrives.
pub async fn request_location(Extension(screen): Extension<SharedScreen>) -> StatusCode {
    screen.lock().await.request_location();
    StatusCode::ACCEPTED
}
