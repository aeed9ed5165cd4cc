use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// Muscle balance

/// Working-set volume attributed to one muscle-group category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleGroupVolume {
    pub category: String,
    pub total_volume: f64,
    pub set_count: u32,
    pub session_count: u32,
    pub avg_set_volume: f64,
    pub percentage: f64, // Share of the window's total volume (0-100)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImbalanceSeverity {
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImbalanceDirection {
    Overworked,
    Underworked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleImbalance {
    pub category: String,
    pub percentage: f64,
    pub expected_percentage: f64,
    pub deviation: f64,
    pub severity: ImbalanceSeverity,
    pub direction: ImbalanceDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleBalanceReport {
    pub balance: Vec<MuscleGroupVolume>,
    pub total_volume: f64,
    pub recommendations: Vec<String>,
    pub imbalances: Vec<MuscleImbalance>,
}

impl MuscleBalanceReport {
    pub const START_TRACKING: &'static str = "Start tracking workouts to get muscle group analysis";

    /// Returned when the window holds no working sets or the store is unavailable
    pub fn empty() -> Self {
        Self {
            balance: Vec::new(),
            total_volume: 0.0,
            recommendations: vec![Self::START_TRACKING.to_string()],
            imbalances: Vec::new(),
        }
    }
}

// Progression

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionTrend {
    Improving,
    SlightlyImproving,
    Stable,
    SlightlyDeclining,
    Declining,
    InsufficientData,
}

/// Best set of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub session_id: Uuid,
    pub weight: f64,
    pub reps: u32,
    pub volume: f64,
    pub estimated_one_rep_max: f64,
}

/// Per-week maxima of the best-set series, for charting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgress {
    pub week_start: NaiveDate,
    pub max_weight: f64,
    pub max_reps: u32,
    pub max_volume: f64,
    pub max_one_rep_max: f64,
    pub sessions: u32,
}

/// Least-squares slopes of the best-set series, per session index
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionSlopes {
    pub volume: f64,
    pub one_rep_max: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projections {
    pub next_month: f64,
    pub next_quarter: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionReport {
    pub exercise_id: Uuid,
    pub exercise_name: Option<String>,
    pub trend: ProgressionTrend,
    pub best_sets: Vec<TrendPoint>,
    pub weekly_progress: Vec<WeeklyProgress>,
    pub slopes: ProgressionSlopes,
    pub volume_change_percent: f64,
    pub strength_change_percent: f64,
    pub weight_change_percent: f64,
    pub consistency_score: f64,
    pub current_one_rep_max: f64,
    pub personal_best: Option<TrendPoint>,
    pub total_sessions: u32,
    /// `None` when fewer than the minimum number of sessions exist
    pub projections: Option<Projections>,
}

impl ProgressionReport {
    pub fn insufficient_data(exercise_id: Uuid) -> Self {
        Self {
            exercise_id,
            exercise_name: None,
            trend: ProgressionTrend::InsufficientData,
            best_sets: Vec::new(),
            weekly_progress: Vec::new(),
            slopes: ProgressionSlopes::default(),
            volume_change_percent: 0.0,
            strength_change_percent: 0.0,
            weight_change_percent: 0.0,
            consistency_score: 0.0,
            current_one_rep_max: 0.0,
            personal_best: None,
            total_sessions: 0,
            projections: None,
        }
    }
}

// Strength ratios

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioStatus {
    Excellent,
    Good,
    NeedsAttention,
    Concerning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioAssessment {
    pub name: String,
    pub primary_exercise: String,
    pub secondary_exercise: String,
    pub primary_max: f64,
    pub secondary_max: f64,
    pub actual_ratio: f64,
    pub ideal_ratio: f64,
    pub deviation_percent: f64,
    pub status: RatioStatus,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallBalance {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
    InsufficientData,
}

impl OverallBalance {
    pub fn label(&self) -> &'static str {
        match self {
            OverallBalance::Excellent => "excellent",
            OverallBalance::Good => "good",
            OverallBalance::Fair => "fair",
            OverallBalance::NeedsImprovement => "needs_improvement",
            OverallBalance::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthRatioReport {
    pub ratios: Vec<RatioAssessment>,
    pub overall_balance: OverallBalance,
}

impl StrengthRatioReport {
    pub fn empty() -> Self {
        Self {
            ratios: Vec::new(),
            overall_balance: OverallBalance::InsufficientData,
        }
    }
}

// Volume distribution

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyVolume {
    pub week_start: NaiveDate,
    pub total_volume: f64,
    pub total_sets: u32,
    pub workout_days: u32,
    pub exercise_count: u32,
    pub avg_volume_per_workout: f64,
    pub category_breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseVolume {
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub muscle_group_category: String,
    pub total_volume: f64,
    pub total_sets: u32,
    pub workout_days: u32,
    pub avg_weight: f64,
    pub avg_reps: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDistributionReport {
    pub weekly: Vec<WeeklyVolume>,
    pub exercise_distribution: Vec<ExerciseVolume>,
    pub total_volume: f64,
    pub volume_trend: f64, // Slope of weekly totals
    pub volume_change_percent: f64,
    pub consistency_score: f64,
    pub avg_workouts_per_week: f64,
    pub insights: Vec<String>,
}

impl VolumeDistributionReport {
    pub const START_TRACKING: &'static str = "Log workouts to see how your training volume is distributed";

    pub fn empty() -> Self {
        Self {
            weekly: Vec::new(),
            exercise_distribution: Vec::new(),
            total_volume: 0.0,
            volume_trend: 0.0,
            volume_change_percent: 0.0,
            consistency_score: 0.0,
            avg_workouts_per_week: 0.0,
            insights: vec![Self::START_TRACKING.to_string()],
        }
    }
}

// Frequency

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub sessions: u32,
    pub duration_minutes: f64,
    pub set_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyFrequency {
    pub week_start: NaiveDate,
    pub workouts: u32,
    pub workout_days: u32,
    pub duration_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyReport {
    pub total_workouts: u32,
    pub workout_days: u32,
    pub avg_workouts_per_week: f64,
    pub avg_duration_minutes: f64,
    pub consistency_score: f64,
    pub longest_streak: u32,
    pub current_streak: u32,
    pub daily: Vec<DailyActivity>,
    pub weekly: Vec<WeeklyFrequency>,
    pub recommendations: Vec<String>,
}

impl FrequencyReport {
    pub const START_TRACKING: &'static str = "Complete your first workout to start tracking frequency";

    pub fn empty() -> Self {
        Self {
            total_workouts: 0,
            workout_days: 0,
            avg_workouts_per_week: 0.0,
            avg_duration_minutes: 0.0,
            consistency_score: 0.0,
            longest_streak: 0,
            current_streak: 0,
            daily: Vec::new(),
            weekly: Vec::new(),
            recommendations: vec![Self::START_TRACKING.to_string()],
        }
    }
}

// Personal records

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recency {
    Recent,
    Moderate,
    Old,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub muscle_group_category: String,
    pub max_weight: f64,
    pub max_reps: u32,
    pub max_volume: f64,
    pub estimated_one_rep_max: f64,
    pub session_count: u32,
    pub avg_weight: f64,
    pub avg_reps: f64,
    pub first_performed: DateTime<Utc>,
    pub last_performed: DateTime<Utc>,
    pub recency: Recency,
}

// Composite score

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingTier {
    Elite,
    Advanced,
    Intermediate,
    #[serde(rename = "Beginner+")]
    BeginnerPlus,
    Beginner,
    #[serde(rename = "Getting Started")]
    GettingStarted,
}

/// Points one sub-analyzer contributed, and what they were based on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponent {
    pub points: u32,
    pub max_points: u32,
    pub basis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub muscle_balance: ScoreComponent,
    pub strength_balance: ScoreComponent,
    pub consistency: ScoreComponent,
    pub frequency: ScoreComponent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessScore {
    pub percentage: u32,
    pub rating_tier: RatingTier,
    pub breakdown: ScoreBreakdown,
}

// Dashboard

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveAnalytics {
    pub overall_score: FitnessScore,
    pub muscle_balance: MuscleBalanceReport,
    pub volume_distribution: VolumeDistributionReport,
    pub strength_ratios: StrengthRatioReport,
    pub personal_records: Vec<PersonalRecord>,
    pub frequency_analysis: FrequencyReport,
    pub last_updated: DateTime<Utc>,
}
