use tracing::debug;

use crate::config::ScoreConfig;
use crate::models::{
    FitnessScore, FrequencyReport, MuscleBalanceReport, OverallBalance, RatingTier, ScoreBreakdown,
    ScoreComponent, StrengthRatioReport,
};

/// Folds the balance, strength and frequency reports into one 0-100 score.
///
/// Each of the four components is worth `component_max` points:
/// muscle balance from the imbalance count, strength balance from the
/// overall ratio label, consistency from the weekly frequency consistency,
/// and frequency from the average workouts per week.
#[derive(Debug, Clone)]
pub struct FitnessScoreService {
    config: ScoreConfig,
}

impl FitnessScoreService {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    pub fn calculate(
        &self,
        muscle_balance: &MuscleBalanceReport,
        strength_ratios: &StrengthRatioReport,
        frequency: &FrequencyReport,
    ) -> FitnessScore {
        self.calculate_from_parts(
            muscle_balance.imbalances.len(),
            strength_ratios.overall_balance,
            frequency.consistency_score,
            frequency.avg_workouts_per_week,
        )
    }

    pub fn calculate_from_parts(
        &self,
        imbalance_count: usize,
        overall_balance: OverallBalance,
        consistency_score: f64,
        avg_workouts_per_week: f64,
    ) -> FitnessScore {
        let breakdown = ScoreBreakdown {
            muscle_balance: self.muscle_balance_component(imbalance_count),
            strength_balance: self.strength_balance_component(overall_balance),
            consistency: self.consistency_component(consistency_score),
            frequency: self.frequency_component(avg_workouts_per_week),
        };

        let earned = breakdown.muscle_balance.points
            + breakdown.strength_balance.points
            + breakdown.consistency.points
            + breakdown.frequency.points;
        let possible = self.config.component_max * 4;

        let percentage = if possible == 0 {
            0
        } else {
            ((earned as f64 / possible as f64) * 100.0).round().clamp(0.0, 100.0) as u32
        };

        let rating_tier = self.tier_for(percentage);
        debug!("Fitness score {}% ({:?})", percentage, rating_tier);

        FitnessScore {
            percentage,
            rating_tier,
            breakdown,
        }
    }

    pub fn tier_for(&self, percentage: u32) -> RatingTier {
        self.config
            .tiers
            .iter()
            .find(|t| percentage >= t.min_percentage)
            .map(|t| t.tier)
            .unwrap_or(RatingTier::GettingStarted)
    }

    fn muscle_balance_component(&self, imbalance_count: usize) -> ScoreComponent {
        let points = self
            .config
            .imbalance_steps
            .iter()
            .find(|step| imbalance_count <= step.max_imbalances)
            .map(|step| step.points)
            .unwrap_or(self.config.imbalance_fallback_points);

        self.component(points, format!("{} muscle group imbalances", imbalance_count))
    }

    fn strength_balance_component(&self, overall_balance: OverallBalance) -> ScoreComponent {
        let table = &self.config.balance_points;
        let points = match overall_balance {
            OverallBalance::Excellent => table.excellent,
            OverallBalance::Good => table.good,
            OverallBalance::Fair => table.fair,
            OverallBalance::NeedsImprovement => table.needs_improvement,
            OverallBalance::InsufficientData => table.insufficient_data,
        };

        self.component(points, format!("Strength balance: {}", overall_balance.label()))
    }

    fn consistency_component(&self, consistency_score: f64) -> ScoreComponent {
        let points = (consistency_score.max(0.0) * self.config.consistency_weight).round() as u32;
        self.component(points, format!("Consistency score {:.0}", consistency_score))
    }

    fn frequency_component(&self, avg_workouts_per_week: f64) -> ScoreComponent {
        let points = self
            .config
            .frequency_bands
            .iter()
            .find(|band| band.contains(avg_workouts_per_week))
            .map(|band| band.points)
            .unwrap_or(self.config.frequency_fallback_points);

        self.component(points, format!("{:.1} workouts per week", avg_workouts_per_week))
    }

    fn component(&self, points: u32, basis: String) -> ScoreComponent {
        ScoreComponent {
            points: points.min(self.config.component_max),
            max_points: self.config.component_max,
            basis,
        }
    }
}

impl Default for FitnessScoreService {
    fn default() -> Self {
        Self::new(ScoreConfig::default())
    }
}
