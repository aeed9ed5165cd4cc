use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use workout_analytics::api::routes::create_routes;
use workout_analytics::config::{AnalyticsConfig, AppConfig};
use workout_analytics::services::AnalyticsService;
use workout_analytics::storage::InMemoryRecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level))
        )
        .init();

    let analytics_config = match &config.analytics_config_path {
        Some(path) => AnalyticsConfig::from_file(path)?,
        None => AnalyticsConfig::default(),
    };
    analytics_config.validate()?;

    let store = match &config.records_path {
        Some(path) => InMemoryRecordStore::load(path)?,
        None => {
            warn!("RECORDS_PATH not set, serving analytics over an empty workout log");
            InMemoryRecordStore::default()
        }
    };

    let service = Arc::new(AnalyticsService::new(Arc::new(store), analytics_config));
    let app = create_routes(service);

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Workout analytics server starting on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
