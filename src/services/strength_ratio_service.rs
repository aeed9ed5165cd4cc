use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{StrengthRatioConfig, StrengthRatioDefinition};
use crate::errors::{AnalyticsError, AnalyticsResult};
use crate::models::{
    AnalysisWindow, OverallBalance, RatioAssessment, RatioStatus, SetFilter, SetRecord,
    StrengthRatioReport,
};
use crate::services::statistics::{estimated_one_rep_max, round_to};
use crate::storage::RecordStore;

/// Compares estimated maxes of paired lifts against their ideal ratios
#[derive(Clone)]
pub struct StrengthRatioService {
    store: Arc<dyn RecordStore>,
    config: StrengthRatioConfig,
}

impl StrengthRatioService {
    pub fn new(store: Arc<dyn RecordStore>, config: StrengthRatioConfig) -> Self {
        Self { store, config }
    }

    pub async fn analyze(&self, window: &AnalysisWindow) -> AnalyticsResult<StrengthRatioReport> {
        info!("Analyzing strength ratios");

        let sets = match self.store.list_sets(&SetFilter::working_sets(window)).await {
            Ok(sets) => sets,
            Err(e) => {
                warn!("{}", AnalyticsError::data_unavailable("Strength ratios", &e));
                return Ok(StrengthRatioReport::empty());
            }
        };

        Ok(self.build_report(&sets))
    }

    /// Evaluate a single configured ratio by name
    pub async fn assess_ratio(
        &self,
        name: &str,
        window: &AnalysisWindow,
    ) -> AnalyticsResult<Option<RatioAssessment>> {
        let definition = self
            .config
            .ratios
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AnalyticsError::invalid_argument(format!("unknown strength ratio '{}'", name)))?;

        let sets = match self.store.list_sets(&SetFilter::working_sets(window)).await {
            Ok(sets) => sets,
            Err(e) => {
                warn!("{}", AnalyticsError::data_unavailable(&format!("Strength ratio '{}'", name), &e));
                return Ok(None);
            }
        };

        Ok(self.assess(definition, &Self::max_one_rep_maxes(&sets)))
    }

    pub fn build_report(&self, sets: &[SetRecord]) -> StrengthRatioReport {
        let maxes = Self::max_one_rep_maxes(sets);

        let ratios: Vec<RatioAssessment> = self
            .config
            .ratios
            .iter()
            .filter_map(|definition| self.assess(definition, &maxes))
            .collect();

        debug!("Computed {} of {} strength ratios", ratios.len(), self.config.ratios.len());

        let overall_balance = self.overall_balance(&ratios);
        StrengthRatioReport {
            ratios,
            overall_balance,
        }
    }

    /// Best estimated 1RM per exercise name, keyed case-insensitively
    fn max_one_rep_maxes(sets: &[SetRecord]) -> HashMap<String, f64> {
        let mut maxes: HashMap<String, f64> = HashMap::new();

        for set in sets.iter().filter(|s| s.is_working_set()) {
            let one_rep_max = estimated_one_rep_max(set.weight, set.reps);
            let entry = maxes.entry(set.exercise_name.to_lowercase()).or_insert(0.0);
            *entry = entry.max(one_rep_max);
        }

        maxes
    }

    fn assess(
        &self,
        definition: &StrengthRatioDefinition,
        maxes: &HashMap<String, f64>,
    ) -> Option<RatioAssessment> {
        let lookup = |name: &str| maxes.get(&name.to_lowercase()).copied().unwrap_or(0.0);

        let primary_max = lookup(&definition.primary);
        let (secondary_exercise, secondary_max) = definition
            .secondaries
            .iter()
            .map(|name| (name, lookup(name)))
            .fold(None, |best: Option<(&String, f64)>, candidate| match best {
                Some(current) if current.1 >= candidate.1 => Some(current),
                _ => Some(candidate),
            })?;

        if primary_max <= 0.0 || secondary_max <= 0.0 {
            return None;
        }

        let actual_ratio = primary_max / secondary_max;
        let deviation_percent = (actual_ratio - definition.ideal_ratio).abs() / definition.ideal_ratio * 100.0;

        let recommendation = if actual_ratio < definition.ideal_ratio {
            definition.below_ideal_recommendation.clone()
        } else {
            definition.above_ideal_recommendation.clone()
        };

        Some(RatioAssessment {
            name: definition.name.clone(),
            primary_exercise: definition.primary.clone(),
            secondary_exercise: secondary_exercise.clone(),
            primary_max,
            secondary_max,
            actual_ratio: round_to(actual_ratio, 2),
            ideal_ratio: definition.ideal_ratio,
            deviation_percent: round_to(deviation_percent, 1),
            status: self.status_for(deviation_percent),
            recommendation,
        })
    }

    fn status_for(&self, deviation_percent: f64) -> RatioStatus {
        if deviation_percent < self.config.excellent_deviation {
            RatioStatus::Excellent
        } else if deviation_percent < self.config.good_deviation {
            RatioStatus::Good
        } else if deviation_percent < self.config.needs_attention_deviation {
            RatioStatus::NeedsAttention
        } else {
            RatioStatus::Concerning
        }
    }

    fn overall_balance(&self, ratios: &[RatioAssessment]) -> OverallBalance {
        if ratios.is_empty() {
            return OverallBalance::InsufficientData;
        }

        let total = ratios.len() as f64;
        let share = |status: RatioStatus| ratios.iter().filter(|r| r.status == status).count() as f64 / total;

        let excellent = share(RatioStatus::Excellent);
        let good = share(RatioStatus::Good);
        let concerning = share(RatioStatus::Concerning);

        if excellent >= self.config.excellent_share {
            OverallBalance::Excellent
        } else if concerning >= self.config.concerning_share {
            OverallBalance::NeedsImprovement
        } else if excellent + good >= self.config.good_share {
            OverallBalance::Good
        } else {
            OverallBalance::Fair
        }
    }
}
