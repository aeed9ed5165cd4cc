use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::analytics::analytics_routes;
use super::health::health_check;
use crate::services::AnalyticsService;

pub fn create_routes(service: Arc<AnalyticsService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/analytics", analytics_routes(service))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
