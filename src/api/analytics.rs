use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::AnalyticsResult;
use crate::models::{
    AnalysisWindow, ComprehensiveAnalytics, FitnessScore, FrequencyReport, MuscleBalanceReport,
    PersonalRecord, ProgressionReport, RatioAssessment, StrengthRatioReport,
    VolumeDistributionReport,
};
use crate::services::AnalyticsService;

const DEFAULT_TIMEFRAME_DAYS: i64 = 30;
const DEFAULT_LONG_TIMEFRAME_DAYS: i64 = 90;

#[derive(Debug, Default, Deserialize)]
pub struct TimeframeQuery {
    pub timeframe: Option<i64>,
}

impl TimeframeQuery {
    fn window(&self, default_days: i64) -> AnalyticsResult<AnalysisWindow> {
        AnalysisWindow::last_days(self.timeframe.unwrap_or(default_days))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    pub limit: Option<usize>,
}

pub fn analytics_routes(service: Arc<AnalyticsService>) -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/muscle-balance", get(get_muscle_balance))
        .route("/progression/:exercise_id", get(get_progression))
        .route("/strength-ratios", get(get_strength_ratios))
        .route("/strength-ratios/:name", get(get_strength_ratio))
        .route("/volume-distribution", get(get_volume_distribution))
        .route("/frequency", get(get_frequency))
        .route("/personal-records", get(get_personal_records))
        .route("/fitness-score", get(get_fitness_score))
        .with_state(service)
}

/// Full dashboard with every analyzer and the composite score
pub async fn get_dashboard(
    State(service): State<Arc<AnalyticsService>>,
    Query(query): Query<TimeframeQuery>,
) -> AnalyticsResult<Json<ComprehensiveAnalytics>> {
    let timeframe = query.timeframe.unwrap_or(DEFAULT_TIMEFRAME_DAYS);
    Ok(Json(service.comprehensive(timeframe).await?))
}

pub async fn get_muscle_balance(
    State(service): State<Arc<AnalyticsService>>,
    Query(query): Query<TimeframeQuery>,
) -> AnalyticsResult<Json<MuscleBalanceReport>> {
    let window = query.window(DEFAULT_TIMEFRAME_DAYS)?;
    Ok(Json(service.muscle_balance(&window).await?))
}

pub async fn get_progression(
    State(service): State<Arc<AnalyticsService>>,
    Path(exercise_id): Path<Uuid>,
    Query(query): Query<TimeframeQuery>,
) -> AnalyticsResult<Json<ProgressionReport>> {
    let window = query.window(DEFAULT_LONG_TIMEFRAME_DAYS)?;
    Ok(Json(service.progression(exercise_id, &window).await?))
}

pub async fn get_strength_ratios(
    State(service): State<Arc<AnalyticsService>>,
) -> AnalyticsResult<Json<StrengthRatioReport>> {
    Ok(Json(service.strength_ratios(Utc::now()).await?))
}

/// A single named ratio; `null` when either lift has no logged sets
pub async fn get_strength_ratio(
    State(service): State<Arc<AnalyticsService>>,
    Path(name): Path<String>,
) -> AnalyticsResult<Json<Option<RatioAssessment>>> {
    Ok(Json(service.assess_ratio(&name, Utc::now()).await?))
}

pub async fn get_volume_distribution(
    State(service): State<Arc<AnalyticsService>>,
    Query(query): Query<TimeframeQuery>,
) -> AnalyticsResult<Json<VolumeDistributionReport>> {
    let window = query.window(DEFAULT_TIMEFRAME_DAYS)?;
    Ok(Json(service.volume_distribution(&window).await?))
}

pub async fn get_frequency(
    State(service): State<Arc<AnalyticsService>>,
    Query(query): Query<TimeframeQuery>,
) -> AnalyticsResult<Json<FrequencyReport>> {
    let window = query.window(DEFAULT_LONG_TIMEFRAME_DAYS)?;
    Ok(Json(service.frequency(&window).await?))
}

pub async fn get_personal_records(
    State(service): State<Arc<AnalyticsService>>,
    Query(query): Query<RecordsQuery>,
) -> AnalyticsResult<Json<Vec<PersonalRecord>>> {
    Ok(Json(service.personal_records(Utc::now(), query.limit).await?))
}

pub async fn get_fitness_score(
    State(service): State<Arc<AnalyticsService>>,
    Query(query): Query<TimeframeQuery>,
) -> AnalyticsResult<Json<FitnessScore>> {
    let window = query.window(DEFAULT_TIMEFRAME_DAYS)?;
    Ok(Json(service.fitness_score(&window).await?))
}
