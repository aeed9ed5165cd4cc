use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{AnalyticsConfig, OrchestratorConfig};
use crate::errors::{AnalyticsError, AnalyticsResult};
use crate::models::{
    AnalysisWindow, ComprehensiveAnalytics, FitnessScore, FrequencyReport, MuscleBalanceReport,
    PersonalRecord, ProgressionReport, RatioAssessment, StrengthRatioReport,
    VolumeDistributionReport,
};
use crate::services::{
    FitnessScoreService, FrequencyService, MuscleBalanceService, PersonalRecordsService,
    ProgressionService, StrengthRatioService, VolumeDistributionService,
};
use crate::storage::RecordStore;

/// Entry point for the analytics dashboard and the individual analyzers.
///
/// The dashboard fans out to the five store-backed analyzers concurrently.
/// Each branch has its own timeout and falls back to that analyzer's empty
/// report, so one slow or failing read never blanks out the rest.
#[derive(Clone)]
pub struct AnalyticsService {
    muscle_balance: MuscleBalanceService,
    progression: ProgressionService,
    strength_ratios: StrengthRatioService,
    volume_distribution: VolumeDistributionService,
    frequency: FrequencyService,
    personal_records: PersonalRecordsService,
    fitness_score: FitnessScoreService,
    orchestrator: OrchestratorConfig,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn RecordStore>, config: AnalyticsConfig) -> Self {
        Self {
            muscle_balance: MuscleBalanceService::new(store.clone(), config.muscle_balance),
            progression: ProgressionService::new(store.clone(), config.progression),
            strength_ratios: StrengthRatioService::new(store.clone(), config.strength_ratios),
            volume_distribution: VolumeDistributionService::new(store.clone(), config.volume),
            frequency: FrequencyService::new(store.clone(), config.frequency),
            personal_records: PersonalRecordsService::new(store, config.recency),
            fitness_score: FitnessScoreService::new(config.score),
            orchestrator: config.orchestrator,
        }
    }

    pub async fn comprehensive(&self, timeframe_days: i64) -> AnalyticsResult<ComprehensiveAnalytics> {
        self.comprehensive_at(Utc::now(), timeframe_days).await
    }

    /// Full dashboard as of `now`. Only an invalid timeframe is returned as an error.
    pub async fn comprehensive_at(
        &self,
        now: DateTime<Utc>,
        timeframe_days: i64,
    ) -> AnalyticsResult<ComprehensiveAnalytics> {
        let window = AnalysisWindow::ending_at(now, timeframe_days)?;
        let all_time = AnalysisWindow::all_time(now);
        let limit = Some(self.orchestrator.personal_records_limit);

        info!("Building comprehensive analytics for the last {} days", timeframe_days);

        let (muscle_balance, volume_distribution, strength_ratios, personal_records, frequency_analysis) = tokio::join!(
            self.guarded("muscle_balance", self.muscle_balance.analyze(&window), MuscleBalanceReport::empty),
            self.guarded(
                "volume_distribution",
                self.volume_distribution.analyze(&window),
                VolumeDistributionReport::empty,
            ),
            self.guarded("strength_ratios", self.strength_ratios.analyze(&all_time), StrengthRatioReport::empty),
            self.guarded("personal_records", self.personal_records.analyze(&all_time, limit), Vec::new),
            self.guarded("frequency", self.frequency.analyze(&window), FrequencyReport::empty),
        );

        let overall_score = self
            .fitness_score
            .calculate(&muscle_balance, &strength_ratios, &frequency_analysis);

        Ok(ComprehensiveAnalytics {
            overall_score,
            muscle_balance,
            volume_distribution,
            strength_ratios,
            personal_records,
            frequency_analysis,
            last_updated: now,
        })
    }

    pub async fn muscle_balance(&self, window: &AnalysisWindow) -> AnalyticsResult<MuscleBalanceReport> {
        self.muscle_balance.analyze(window).await
    }

    pub async fn progression(
        &self,
        exercise_id: Uuid,
        window: &AnalysisWindow,
    ) -> AnalyticsResult<ProgressionReport> {
        self.progression.analyze(exercise_id, window).await
    }

    /// Ratios use every logged set up to `now`
    pub async fn strength_ratios(&self, now: DateTime<Utc>) -> AnalyticsResult<StrengthRatioReport> {
        self.strength_ratios.analyze(&AnalysisWindow::all_time(now)).await
    }

    pub async fn assess_ratio(&self, name: &str, now: DateTime<Utc>) -> AnalyticsResult<Option<RatioAssessment>> {
        self.strength_ratios.assess_ratio(name, &AnalysisWindow::all_time(now)).await
    }

    pub async fn volume_distribution(&self, window: &AnalysisWindow) -> AnalyticsResult<VolumeDistributionReport> {
        self.volume_distribution.analyze(window).await
    }

    pub async fn frequency(&self, window: &AnalysisWindow) -> AnalyticsResult<FrequencyReport> {
        self.frequency.analyze(window).await
    }

    pub async fn personal_records(
        &self,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> AnalyticsResult<Vec<PersonalRecord>> {
        self.personal_records.analyze(&AnalysisWindow::all_time(now), limit).await
    }

    /// Composite score only, without the rest of the dashboard
    pub async fn fitness_score(&self, window: &AnalysisWindow) -> AnalyticsResult<FitnessScore> {
        let all_time = AnalysisWindow::all_time(window.now);

        let (muscle_balance, strength_ratios, frequency) = tokio::join!(
            self.guarded("muscle_balance", self.muscle_balance.analyze(window), MuscleBalanceReport::empty),
            self.guarded("strength_ratios", self.strength_ratios.analyze(&all_time), StrengthRatioReport::empty),
            self.guarded("frequency", self.frequency.analyze(window), FrequencyReport::empty),
        );

        Ok(self.fitness_score.calculate(&muscle_balance, &strength_ratios, &frequency))
    }

    async fn guarded<T, F>(&self, analyzer: &'static str, analysis: F, fallback: fn() -> T) -> T
    where
        F: Future<Output = AnalyticsResult<T>>,
    {
        let limit = Duration::from_millis(self.orchestrator.analyzer_timeout_ms);

        match timeout(limit, analysis).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!("Analyzer {} failed, using empty result: {}", analyzer, e);
                fallback()
            }
            Err(_) => {
                let e = AnalyticsError::Timeout {
                    analyzer,
                    timeout_ms: self.orchestrator.analyzer_timeout_ms,
                };
                warn!("{}, using empty result", e);
                fallback()
            }
        }
    }
}
