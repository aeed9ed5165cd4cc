use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MuscleBalanceThresholds;
use crate::errors::{AnalyticsError, AnalyticsResult};
use crate::models::{
    AnalysisWindow, ImbalanceDirection, ImbalanceSeverity, MuscleBalanceReport, MuscleGroupVolume,
    MuscleImbalance, SetFilter, SetRecord,
};
use crate::services::statistics::{percentage, round_to};
use crate::storage::RecordStore;

/// Aggregates working-set volume per muscle-group category and flags imbalances
#[derive(Clone)]
pub struct MuscleBalanceService {
    store: Arc<dyn RecordStore>,
    thresholds: MuscleBalanceThresholds,
}

#[derive(Default)]
struct CategoryTotals {
    volume: f64,
    sets: u32,
    sessions: HashSet<Uuid>,
}

impl MuscleBalanceService {
    pub fn new(store: Arc<dyn RecordStore>, thresholds: MuscleBalanceThresholds) -> Self {
        Self { store, thresholds }
    }

    pub async fn analyze(&self, window: &AnalysisWindow) -> AnalyticsResult<MuscleBalanceReport> {
        info!("Analyzing muscle balance over {:?} days", window.timeframe_days);

        let sets = match self.store.list_sets(&SetFilter::working_sets(window)).await {
            Ok(sets) => sets,
            Err(e) => {
                warn!("{}", AnalyticsError::data_unavailable("Muscle balance", &e));
                return Ok(MuscleBalanceReport::empty());
            }
        };

        Ok(self.build_report(&sets))
    }

    pub fn build_report(&self, sets: &[SetRecord]) -> MuscleBalanceReport {
        let mut totals: BTreeMap<&str, CategoryTotals> = BTreeMap::new();

        for set in sets.iter().filter(|s| s.is_working_set()) {
            let entry = totals.entry(set.muscle_group_category.as_str()).or_default();
            entry.volume += set.volume();
            entry.sets += 1;
            entry.sessions.insert(set.session_id);
        }

        let total_volume: f64 = totals.values().map(|t| t.volume).sum();
        if totals.is_empty() || total_volume <= 0.0 {
            return MuscleBalanceReport::empty();
        }

        let mut balance: Vec<MuscleGroupVolume> = totals
            .into_iter()
            .map(|(category, t)| MuscleGroupVolume {
                category: category.to_string(),
                total_volume: t.volume,
                set_count: t.sets,
                session_count: t.sessions.len() as u32,
                avg_set_volume: round_to(t.volume / t.sets as f64, 2),
                percentage: round_to(percentage(t.volume, total_volume), 2),
            })
            .collect();

        balance.sort_by(|a, b| {
            b.total_volume
                .total_cmp(&a.total_volume)
                .then_with(|| a.category.cmp(&b.category))
        });

        debug!("Muscle balance across {} categories", balance.len());

        let imbalances = self.identify_imbalances(&balance);
        let recommendations = self.generate_recommendations(&balance, &imbalances);

        MuscleBalanceReport {
            balance,
            total_volume,
            recommendations,
            imbalances,
        }
    }

    fn identify_imbalances(&self, balance: &[MuscleGroupVolume]) -> Vec<MuscleImbalance> {
        let expected = 100.0 / balance.len() as f64;

        balance
            .iter()
            .filter_map(|group| {
                let deviation = (group.percentage - expected).abs();
                if deviation <= self.thresholds.imbalance_threshold {
                    return None;
                }

                let severity = if deviation > self.thresholds.high_severity_threshold {
                    ImbalanceSeverity::High
                } else {
                    ImbalanceSeverity::Moderate
                };

                let direction = if group.percentage > expected {
                    ImbalanceDirection::Overworked
                } else {
                    ImbalanceDirection::Underworked
                };

                Some(MuscleImbalance {
                    category: group.category.clone(),
                    percentage: group.percentage,
                    expected_percentage: round_to(expected, 2),
                    deviation: round_to(deviation, 2),
                    severity,
                    direction,
                })
            })
            .collect()
    }

    fn generate_recommendations(
        &self,
        balance: &[MuscleGroupVolume],
        imbalances: &[MuscleImbalance],
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        let names_for = |direction: ImbalanceDirection| -> Vec<&str> {
            imbalances
                .iter()
                .filter(|i| i.direction == direction)
                .map(|i| i.category.as_str())
                .collect()
        };

        let underworked = names_for(ImbalanceDirection::Underworked);
        if !underworked.is_empty() {
            recommendations.push(format!(
                "Increase training volume for: {}",
                underworked.join(", ")
            ));
        }

        let overworked = names_for(ImbalanceDirection::Overworked);
        if !overworked.is_empty() {
            recommendations.push(format!(
                "Consider reducing volume or rebalancing for: {}",
                overworked.join(", ")
            ));
        }

        let share_of = |category: &str| {
            balance
                .iter()
                .find(|g| g.category.eq_ignore_ascii_case(category))
                .map(|g| g.percentage)
        };

        if let (Some(push), Some(pull)) = (
            share_of(&self.thresholds.push_category),
            share_of(&self.thresholds.pull_category),
        ) {
            if pull > 0.0 {
                let ratio = push / pull;
                if ratio > self.thresholds.push_pull_upper {
                    recommendations.push(format!(
                        "{} volume outweighs {} volume ({:.2}:1). Add more back work such as rows and pull-ups.",
                        self.thresholds.push_category, self.thresholds.pull_category, ratio
                    ));
                } else if ratio < self.thresholds.push_pull_lower {
                    recommendations.push(format!(
                        "{} volume trails {} volume ({:.2}:1). Add more chest work such as presses and flyes.",
                        self.thresholds.push_category, self.thresholds.pull_category, ratio
                    ));
                }
            }
        }

        if recommendations.is_empty() {
            recommendations.push("Your training volume is well balanced across muscle groups".to_string());
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryRecordStore, MockRecordStore};
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn service_with(sets: Vec<SetRecord>) -> MuscleBalanceService {
        let store = InMemoryRecordStore::new(vec![], sets);
        MuscleBalanceService::new(Arc::new(store), MuscleBalanceThresholds::default())
    }

    fn set(category: &str, weight: f64, reps: u32, day: i64) -> SetRecord {
        SetRecord {
            exercise_id: Uuid::new_v4(),
            exercise_name: format!("{} exercise", category),
            muscle_group_category: category.to_string(),
            weight,
            reps,
            is_warmup: false,
            is_completed: true,
            session_id: Uuid::from_u128(day as u128),
            session_date: Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap() + Duration::days(day),
            set_order: 1,
        }
    }

    fn window() -> AnalysisWindow {
        AnalysisWindow::ending_at(Utc.with_ymd_and_hms(2024, 4, 30, 0, 0, 0).unwrap(), 30).unwrap()
    }

    #[tokio::test]
    async fn test_empty_window_returns_start_tracking() {
        let report = service_with(vec![]).analyze(&window()).await.unwrap();

        assert_eq!(report, MuscleBalanceReport::empty());
        assert_eq!(report.total_volume, 0.0);
        assert_eq!(
            report.recommendations,
            vec!["Start tracking workouts to get muscle group analysis".to_string()]
        );
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_empty() {
        let mut store = MockRecordStore::new();
        store
            .expect_list_sets()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let service = MuscleBalanceService::new(Arc::new(store), MuscleBalanceThresholds::default());
        let report = service.analyze(&window()).await.unwrap();
        assert_eq!(report, MuscleBalanceReport::empty());
    }

    #[test]
    fn test_percentages_sum_to_100() {
        let service = service_with(vec![]);
        let report = service.build_report(&[
            set("Chest", 100.0, 7, 1),
            set("Back", 80.0, 10, 1),
            set("Legs", 120.0, 9, 2),
            set("Shoulders", 33.0, 11, 3),
            set("Arms", 17.5, 13, 3),
        ]);

        let sum: f64 = report.balance.iter().map(|g| g.percentage).sum();
        assert!((sum - 100.0).abs() <= 0.1, "sum was {}", sum);
        assert!(report.balance.windows(2).all(|w| w[0].total_volume >= w[1].total_volume));
    }

    #[test]
    fn test_imbalance_severity_and_direction() {
        let service = service_with(vec![]);
        // Chest 70%, Back 20%, Legs 10%; even share is 33.3%
        let report = service.build_report(&[
            set("Chest", 100.0, 7, 1),
            set("Back", 100.0, 2, 1),
            set("Legs", 100.0, 1, 2),
        ]);

        let chest = report.imbalances.iter().find(|i| i.category == "Chest").unwrap();
        assert_eq!(chest.severity, ImbalanceSeverity::High);
        assert_eq!(chest.direction, ImbalanceDirection::Overworked);

        let legs = report.imbalances.iter().find(|i| i.category == "Legs").unwrap();
        assert_eq!(legs.direction, ImbalanceDirection::Underworked);
        assert_eq!(legs.severity, ImbalanceSeverity::Moderate);

        // Back is 13.3 points under the even share: not flagged
        assert!(report.imbalances.iter().all(|i| i.category != "Back"));
        assert!(report.recommendations.iter().any(|r| r.contains("more back work")));
    }

    #[test]
    fn test_imbalance_recommendations_name_categories() {
        let service = service_with(vec![]);
        // Chest 70%, Back 20%, Arms 5%, Legs 5%; even share is 25%
        let report = service.build_report(&[
            set("Chest", 100.0, 14, 1),
            set("Back", 100.0, 4, 1),
            set("Legs", 100.0, 1, 2),
            set("Arms", 50.0, 2, 2),
        ]);

        assert_eq!(report.recommendations[0], "Increase training volume for: Arms, Legs");
        assert_eq!(
            report.recommendations[1],
            "Consider reducing volume or rebalancing for: Chest"
        );
        assert!(report.recommendations[2].contains("more back work"));
    }

    #[test]
    fn test_push_pull_heuristic_suggests_chest() {
        let service = service_with(vec![]);
        let report = service.build_report(&[set("Chest", 50.0, 10, 1), set("Back", 100.0, 10, 1)]);

        assert!(report.recommendations.iter().any(|r| r.contains("more chest work")));
    }

    #[test]
    fn test_balanced_training() {
        let service = service_with(vec![]);
        let report = service.build_report(&[
            set("Chest", 100.0, 10, 1),
            set("Back", 100.0, 10, 1),
            set("Legs", 100.0, 10, 2),
        ]);

        assert!(report.imbalances.is_empty());
        assert_eq!(report.balance[0].session_count, 1);
        assert_eq!(
            report.recommendations,
            vec!["Your training volume is well balanced across muscle groups".to_string()]
        );
    }

    #[test]
    fn test_non_working_sets_ignored() {
        let service = service_with(vec![]);
        let mut warmup = set("Chest", 60.0, 10, 1);
        warmup.is_warmup = true;
        let zero = set("Back", 0.0, 10, 1);

        assert_eq!(service.build_report(&[warmup, zero]), MuscleBalanceReport::empty());
    }

    #[test]
    fn test_idempotent() {
        let service = service_with(vec![]);
        let sets = vec![set("Chest", 100.0, 5, 1), set("Legs", 140.0, 5, 2)];

        let first = serde_json::to_string(&service.build_report(&sets)).unwrap();
        let second = serde_json::to_string(&service.build_report(&sets)).unwrap();
        assert_eq!(first, second);
    }
}
