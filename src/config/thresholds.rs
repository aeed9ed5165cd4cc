use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{AnalyticsError, AnalyticsResult};
use crate::models::RatingTier;

/// Tunable breakpoints for every analyzer.
///
/// The defaults are the product's historical cut-offs; none of them is
/// derived from a domain model, so deployments may override any of them
/// from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub muscle_balance: MuscleBalanceThresholds,

    #[serde(default)]
    pub progression: ProgressionThresholds,

    #[serde(default)]
    pub strength_ratios: StrengthRatioConfig,

    #[serde(default)]
    pub volume: VolumeThresholds,

    #[serde(default)]
    pub frequency: FrequencyThresholds,

    #[serde(default)]
    pub recency: RecencyThresholds,

    #[serde(default)]
    pub score: ScoreConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MuscleBalanceThresholds {
    /// Percentage points away from an even share before a category is flagged
    pub imbalance_threshold: f64,
    pub high_severity_threshold: f64,
    pub push_category: String,
    pub pull_category: String,
    /// Push/pull share ratio above which back work is suggested
    pub push_pull_upper: f64,
    pub push_pull_lower: f64,
}

impl Default for MuscleBalanceThresholds {
    fn default() -> Self {
        Self {
            imbalance_threshold: 15.0,
            high_severity_threshold: 25.0,
            push_category: "Chest".to_string(),
            pull_category: "Back".to_string(),
            push_pull_upper: 1.3,
            push_pull_lower: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionThresholds {
    pub stable_slope: f64,
    pub strong_slope: f64,
    pub min_points: usize,
    pub projection_window: usize,
    pub next_month_steps: f64,
    pub next_quarter_steps: f64,
}

impl Default for ProgressionThresholds {
    fn default() -> Self {
        Self {
            stable_slope: 0.1,
            strong_slope: 0.5,
            min_points: 3,
            projection_window: 5,
            next_month_steps: 4.0,
            next_quarter_steps: 12.0,
        }
    }
}

/// One named pairing of lifts and the ratio between their estimated maxes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthRatioDefinition {
    pub name: String,
    pub primary: String,
    /// Acceptable secondary lifts; the strongest one is used
    pub secondaries: Vec<String>,
    pub ideal_ratio: f64,
    pub below_ideal_recommendation: String,
    pub above_ideal_recommendation: String,
}

impl StrengthRatioDefinition {
    fn new(
        name: &str,
        primary: &str,
        secondaries: &[&str],
        ideal_ratio: f64,
        below: &str,
        above: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            primary: primary.to_string(),
            secondaries: secondaries.iter().map(|s| s.to_string()).collect(),
            ideal_ratio,
            below_ideal_recommendation: below.to_string(),
            above_ideal_recommendation: above.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrengthRatioConfig {
    pub ratios: Vec<StrengthRatioDefinition>,
    pub excellent_deviation: f64,
    pub good_deviation: f64,
    pub needs_attention_deviation: f64,
    pub excellent_share: f64,
    pub concerning_share: f64,
    pub good_share: f64,
}

impl Default for StrengthRatioConfig {
    fn default() -> Self {
        Self {
            ratios: vec![
                StrengthRatioDefinition::new(
                    "Bench Press vs Row",
                    "Bench Press",
                    &["Barbell Row", "Bent Over Row", "Pendlay Row", "Seated Cable Row"],
                    1.0,
                    "Your pressing lags your rowing strength. Prioritise bench press progression.",
                    "Your bench press outpaces your rows. Add rowing volume to protect your shoulders.",
                ),
                StrengthRatioDefinition::new(
                    "Squat vs Deadlift",
                    "Squat",
                    &["Deadlift", "Conventional Deadlift", "Sumo Deadlift"],
                    0.85,
                    "Your squat lags your deadlift. Add squat frequency and quad-focused work.",
                    "Your deadlift lags your squat. Strengthen the posterior chain with hinges.",
                ),
                StrengthRatioDefinition::new(
                    "Overhead Press vs Bench Press",
                    "Overhead Press",
                    &["Bench Press"],
                    0.65,
                    "Your overhead press is behind. Add vertical pressing and shoulder work.",
                    "Your overhead press is strong relative to bench. Bring up horizontal pressing.",
                ),
                StrengthRatioDefinition::new(
                    "Front Squat vs Back Squat",
                    "Front Squat",
                    &["Squat", "Back Squat"],
                    0.85,
                    "Your front squat is behind. Work on upper back strength and torso position.",
                    "Your back squat lags your front squat. Add heavier back squat sessions.",
                ),
            ],
            excellent_deviation: 10.0,
            good_deviation: 20.0,
            needs_attention_deviation: 35.0,
            excellent_share: 0.6,
            concerning_share: 0.4,
            good_share: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeThresholds {
    pub increase_percent: f64,
    pub decrease_percent: f64,
    pub high_consistency: f64,
    pub low_consistency: f64,
    pub low_frequency: f64,
    pub high_frequency: f64,
    pub top_exercises: usize,
    pub min_weeks_for_consistency: usize,
}

impl Default for VolumeThresholds {
    fn default() -> Self {
        Self {
            increase_percent: 10.0,
            decrease_percent: -10.0,
            high_consistency: 80.0,
            low_consistency: 50.0,
            low_frequency: 2.0,
            high_frequency: 6.0,
            top_exercises: 3,
            min_weeks_for_consistency: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyThresholds {
    /// Largest gap in days that still continues a streak
    pub streak_gap_days: i64,
    /// Days since the last workout after which the current streak is broken
    pub current_streak_cutoff_days: i64,
    pub low_frequency: f64,
    pub ideal_min_frequency: f64,
    pub ideal_max_frequency: f64,
    pub high_frequency: f64,
    pub low_consistency: f64,
    pub high_consistency: f64,
    pub short_duration_minutes: f64,
    pub long_duration_minutes: f64,
    pub long_streak: u32,
}

impl Default for FrequencyThresholds {
    fn default() -> Self {
        Self {
            streak_gap_days: 2,
            current_streak_cutoff_days: 3,
            low_frequency: 2.0,
            ideal_min_frequency: 3.0,
            ideal_max_frequency: 5.0,
            high_frequency: 6.0,
            low_consistency: 60.0,
            high_consistency: 80.0,
            short_duration_minutes: 30.0,
            long_duration_minutes: 120.0,
            long_streak: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecencyThresholds {
    pub recent_days: i64,
    pub moderate_days: i64,
}

impl Default for RecencyThresholds {
    fn default() -> Self {
        Self {
            recent_days: 7,
            moderate_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImbalanceStep {
    pub max_imbalances: usize,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancePoints {
    pub excellent: u32,
    pub good: u32,
    pub fair: u32,
    pub needs_improvement: u32,
    pub insufficient_data: u32,
}

impl Default for BalancePoints {
    fn default() -> Self {
        Self {
            excellent: 25,
            good: 20,
            fair: 15,
            needs_improvement: 10,
            insufficient_data: 5,
        }
    }
}

/// Inclusive range of average workouts per week; `max: None` is unbounded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub min: f64,
    pub max: Option<f64>,
    pub points: u32,
}

impl FrequencyBand {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierBreakpoint {
    pub min_percentage: u32,
    pub tier: RatingTier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub component_max: u32,
    pub imbalance_steps: Vec<ImbalanceStep>,
    pub imbalance_fallback_points: u32,
    pub balance_points: BalancePoints,
    pub consistency_weight: f64,
    /// Evaluated in order, first match wins
    pub frequency_bands: Vec<FrequencyBand>,
    pub frequency_fallback_points: u32,
    /// Highest breakpoint first
    pub tiers: Vec<TierBreakpoint>,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            component_max: 25,
            imbalance_steps: vec![
                ImbalanceStep { max_imbalances: 0, points: 25 },
                ImbalanceStep { max_imbalances: 2, points: 15 },
                ImbalanceStep { max_imbalances: 4, points: 10 },
            ],
            imbalance_fallback_points: 5,
            balance_points: BalancePoints::default(),
            consistency_weight: 0.25,
            frequency_bands: vec![
                FrequencyBand { min: 3.0, max: Some(5.0), points: 25 },
                FrequencyBand { min: 2.0, max: Some(6.0), points: 20 },
                FrequencyBand { min: 6.0, max: None, points: 15 },
                FrequencyBand { min: 1.0, max: Some(2.0), points: 10 },
            ],
            frequency_fallback_points: 5,
            tiers: vec![
                TierBreakpoint { min_percentage: 90, tier: RatingTier::Elite },
                TierBreakpoint { min_percentage: 80, tier: RatingTier::Advanced },
                TierBreakpoint { min_percentage: 70, tier: RatingTier::Intermediate },
                TierBreakpoint { min_percentage: 60, tier: RatingTier::BeginnerPlus },
                TierBreakpoint { min_percentage: 50, tier: RatingTier::Beginner },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub analyzer_timeout_ms: u64,
    pub personal_records_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            analyzer_timeout_ms: 5_000,
            personal_records_limit: 10,
        }
    }
}

impl AnalyticsConfig {
    /// Load thresholds from a TOML file, falling back to defaults when it does not exist
    pub fn from_file(path: &Path) -> AnalyticsResult<Self> {
        if !path.exists() {
            tracing::info!("Analytics config {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| AnalyticsError::Config(format!("Failed to read {:?}: {}", path, e)))?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> AnalyticsResult<Self> {
        let mut config: AnalyticsConfig = toml::from_str(contents)
            .map_err(|e| AnalyticsError::Config(format!("Failed to parse analytics config: {}", e)))?;

        // Tier lookup takes the first breakpoint reached
        config
            .score
            .tiers
            .sort_by(|a, b| b.min_percentage.cmp(&a.min_percentage));

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        let positive = [
            ("muscle_balance.imbalance_threshold", self.muscle_balance.imbalance_threshold),
            ("muscle_balance.high_severity_threshold", self.muscle_balance.high_severity_threshold),
            ("progression.stable_slope", self.progression.stable_slope),
            ("progression.strong_slope", self.progression.strong_slope),
            ("strength_ratios.excellent_deviation", self.strength_ratios.excellent_deviation),
            ("strength_ratios.good_deviation", self.strength_ratios.good_deviation),
            ("strength_ratios.needs_attention_deviation", self.strength_ratios.needs_attention_deviation),
            ("score.consistency_weight", self.score.consistency_weight),
        ];

        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(AnalyticsError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }

        if self.progression.projection_window < 2 {
            return Err(AnalyticsError::Config(
                "progression.projection_window must be at least 2".to_string(),
            ));
        }

        if self.strength_ratios.ratios.is_empty() {
            return Err(AnalyticsError::Config("strength_ratios.ratios must not be empty".to_string()));
        }

        if let Some(ratio) = self
            .strength_ratios
            .ratios
            .iter()
            .find(|r| !(r.ideal_ratio > 0.0) || r.secondaries.is_empty())
        {
            return Err(AnalyticsError::Config(format!(
                "strength ratio '{}' needs a positive ideal ratio and at least one secondary lift",
                ratio.name
            )));
        }

        if self
            .score
            .tiers
            .windows(2)
            .any(|pair| pair[0].min_percentage < pair[1].min_percentage)
        {
            return Err(AnalyticsError::Config(
                "score.tiers must be ordered from the highest min_percentage down".to_string(),
            ));
        }

        if self.orchestrator.analyzer_timeout_ms == 0 {
            return Err(AnalyticsError::Config(
                "orchestrator.analyzer_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyticsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.muscle_balance.imbalance_threshold, 15.0);
        assert_eq!(config.strength_ratios.ratios.len(), 4);
        assert_eq!(config.score.tiers[0].tier, RatingTier::Elite);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalyticsConfig::from_toml(
            r#"
            [muscle_balance]
            imbalance_threshold = 20.0

            [orchestrator]
            personal_records_limit = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.muscle_balance.imbalance_threshold, 20.0);
        assert_eq!(config.muscle_balance.high_severity_threshold, 25.0);
        assert_eq!(config.orchestrator.personal_records_limit, 5);
        assert_eq!(config.orchestrator.analyzer_timeout_ms, 5_000);
    }

    #[test]
    fn test_config_serialization() {
        let config = AnalyticsConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized = AnalyticsConfig::from_toml(&serialized).unwrap();

        assert_eq!(
            config.strength_ratios.ratios[1].ideal_ratio,
            deserialized.strength_ratios.ratios[1].ideal_ratio
        );
        assert_eq!(config.score.frequency_bands.len(), deserialized.score.frequency_bands.len());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let result = AnalyticsConfig::from_toml(
            r#"
            [progression]
            stable_slope = 0.0
            "#,
        );
        assert_matches!(result, Err(AnalyticsError::Config(_)));

        let result = AnalyticsConfig::from_toml("[strength_ratios]\nratios = []\n");
        assert_matches!(result, Err(AnalyticsError::Config(_)));
    }

    #[test]
    fn test_ascending_tiers_are_reordered() {
        let config = AnalyticsConfig::from_toml(
            r#"
            [[score.tiers]]
            min_percentage = 50
            tier = "Beginner"

            [[score.tiers]]
            min_percentage = 90
            tier = "Elite"

            [[score.tiers]]
            min_percentage = 70
            tier = "Intermediate"
            "#,
        )
        .unwrap();

        let order: Vec<u32> = config.score.tiers.iter().map(|t| t.min_percentage).collect();
        assert_eq!(order, vec![90, 70, 50]);
        assert_eq!(config.score.tiers[0].tier, RatingTier::Elite);
    }

    #[test]
    fn test_unordered_tiers_rejected() {
        let mut config = AnalyticsConfig::default();
        config.score.tiers.reverse();

        assert_matches!(config.validate(), Err(AnalyticsError::Config(_)));
    }

    #[test]
    fn test_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[frequency]\nstreak_gap_days = 3")?;

        let config = AnalyticsConfig::from_file(file.path())?;
        assert_eq!(config.frequency.streak_gap_days, 3);

        let missing = AnalyticsConfig::from_file(Path::new("/nonexistent/analytics.toml"))?;
        assert_eq!(missing.frequency.streak_gap_days, 2);
        Ok(())
    }

    #[test]
    fn test_frequency_band_contains() {
        let band = FrequencyBand { min: 6.0, max: None, points: 15 };
        assert!(band.contains(6.0));
        assert!(band.contains(12.0));
        assert!(!band.contains(5.9));
    }
}
