//! Writes a synthetic workout library.
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin seed -- ./workouts 50
//! ```

use test_data::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let out_dir = args.next().unwrap_or_else(|| "./workouts".to_string());

    let mut config = SeedConfig::default();
    if let Some(count) = args.next() {
        config.workout_count = count.parse()?;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let summary = LibraryWriter::new(&out_dir).seed(&config, &mut rng).await?;

    tracing::info!("Seed completed!");
    tracing::info!("  Workouts: {}", summary.workouts);
    for activity_type in ActivityType::SELECTABLE {
        tracing::info!(
            "  {}: {}",
            activity_type.display_name(),
            summary.by_type[activity_type]
        );
    }
    tracing::info!("  Chunked: {}", summary.chunked);
    tracing::info!("  Distance: {:.1} km", summary.distance_meters / 1000.0);

    Ok(())
}
