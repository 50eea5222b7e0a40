pub mod aggregator;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod location;
pub mod map;
pub mod models;
pub mod request_id;
pub mod scoring;
pub mod screen;

use std::sync::Arc;

use axum::{
    Extension, Router, middleware,
    http::Method,
    routing::{get, post},
};
use tokio::sync::Mutex;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::{
    aggregator::WorkoutAggregator,
    config::AppConfig,
    handlers::{
        SharedScreen, get_map_geojson, get_screen, get_stats, health_check, not_found,
        request_location, toggle_filter,
    },
    health::{Authorization, GpxLoader, HealthStore, InMemoryHealthStore},
    location::{AuthorizationStatus, FixedLocationSource, LocationSource, LocationWatcher},
    request_id::request_id_middleware,
    screen::MapScreen,
};

pub fn create_router(screen: SharedScreen) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/screen", get(get_screen))
        .route("/map.geojson", get(get_map_geojson))
        .route("/filters/{activity_type}/toggle", post(toggle_filter))
        .route("/location/request", post(request_location))
        .fallback(not_found)
        .layer(Extension(screen))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
}

/// Wires the health store, location source and screen described by `config`.
pub fn build_screen(config: &AppConfig) -> SharedScreen {
    let store = match GpxLoader::load_library(&config.data_dir, config.batch_size) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(
                "No workout library at {}: {e}",
                config.data_dir.display()
            );
            InMemoryHealthStore::new(config.batch_size)
        }
    };
    let authorization = if config.health_authorized {
        Authorization::Granted
    } else {
        Authorization::Declined
    };
    let store: Arc<dyn HealthStore> = Arc::new(store.with_authorization(authorization));

    let status = if config.location_authorized {
        AuthorizationStatus::AuthorizedWhenInUse
    } else {
        AuthorizationStatus::Denied
    };
    let source: Arc<dyn LocationSource> =
        Arc::new(FixedLocationSource::new(config.location_fix).with_status(status));

    let screen = MapScreen::new(
        WorkoutAggregator::new(store),
        LocationWatcher::new(source),
        config.default_types.clone(),
        config.initial_region,
    );

    Arc::new(Mutex::new(screen))
}

pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let screen = build_screen(&config);
    screen.lock().await.appear();

    let app = create_router(screen);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!("Server running on http://0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
