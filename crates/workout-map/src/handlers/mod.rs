//! HTTP request handlers for the map screen.

pub mod map_screen;
pub mod stats;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::screen::MapScreen;

/// The one screen all requests act on.
pub type SharedScreen = Arc<Mutex<MapScreen>>;

pub use map_screen::{get_map_geojson, get_screen, request_location, toggle_filter};
pub use stats::{get_stats, health_check};

pub async fn not_found() -> crate::errors::AppError {
    crate::errors::AppError::NotFound
}
