use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ProgressionThresholds;
use crate::errors::{AnalyticsError, AnalyticsResult};
use crate::models::{
    AnalysisWindow, ProgressionReport, ProgressionSlopes, ProgressionTrend, Projections, SetFilter,
    SetRecord, TrendPoint, WeeklyProgress,
};
use crate::services::statistics::{
    consistency_score, consistency_score_min, estimated_one_rep_max, linear_trend, percent_change,
    round_to, week_start,
};
use crate::storage::RecordStore;

/// Tracks best-set performance of one exercise over time
#[derive(Clone)]
pub struct ProgressionService {
    store: Arc<dyn RecordStore>,
    thresholds: ProgressionThresholds,
}

impl ProgressionService {
    pub fn new(store: Arc<dyn RecordStore>, thresholds: ProgressionThresholds) -> Self {
        Self { store, thresholds }
    }

    pub async fn analyze(
        &self,
        exercise_id: Uuid,
        window: &AnalysisWindow,
    ) -> AnalyticsResult<ProgressionReport> {
        if exercise_id.is_nil() {
            return Err(AnalyticsError::invalid_argument("exercise id must not be nil"));
        }

        info!(
            "Analyzing progression for exercise {} over {:?} days",
            exercise_id, window.timeframe_days
        );

        let filter = SetFilter::working_sets(window).for_exercise(exercise_id);
        let sets = match self.store.list_sets(&filter).await {
            Ok(sets) => sets,
            Err(e) => {
                warn!("{}", AnalyticsError::data_unavailable("Progression", &e));
                return Ok(ProgressionReport::insufficient_data(exercise_id));
            }
        };

        Ok(self.build_report(exercise_id, &sets))
    }

    pub fn build_report(&self, exercise_id: Uuid, sets: &[SetRecord]) -> ProgressionReport {
        let best_sets = Self::best_set_per_session(exercise_id, sets);
        if best_sets.is_empty() {
            return ProgressionReport::insufficient_data(exercise_id);
        }

        let exercise_name = sets
            .iter()
            .find(|s| s.exercise_id == exercise_id)
            .map(|s| s.exercise_name.clone());

        let volumes: Vec<f64> = best_sets.iter().map(|p| p.volume).collect();
        let one_rep_maxes: Vec<f64> = best_sets.iter().map(|p| p.estimated_one_rep_max).collect();
        let weights: Vec<f64> = best_sets.iter().map(|p| p.weight).collect();

        let slopes = ProgressionSlopes {
            volume: linear_trend(&volumes),
            one_rep_max: linear_trend(&one_rep_maxes),
            weight: linear_trend(&weights),
        };

        debug!("Progression slopes for {}: {:?}", exercise_id, slopes);

        let trend = self.classify_trend(&slopes);
        let personal_best = best_sets
            .iter()
            .max_by(|a, b| {
                a.estimated_one_rep_max
                    .total_cmp(&b.estimated_one_rep_max)
                    .then(a.volume.total_cmp(&b.volume))
            })
            .cloned();

        ProgressionReport {
            exercise_id,
            exercise_name,
            trend,
            weekly_progress: Self::weekly_rollup(&best_sets),
            slopes,
            volume_change_percent: round_to(percent_change(&volumes), 2),
            strength_change_percent: round_to(percent_change(&one_rep_maxes), 2),
            weight_change_percent: round_to(percent_change(&weights), 2),
            consistency_score: round_to(
                consistency_score_min(&volumes, self.thresholds.min_points),
                2,
            ),
            current_one_rep_max: one_rep_maxes.last().copied().unwrap_or(0.0),
            personal_best,
            total_sessions: best_sets.len() as u32,
            projections: self.project(&best_sets),
            best_sets,
        }
    }

    /// Highest-volume set of each session, in chronological order
    fn best_set_per_session(exercise_id: Uuid, sets: &[SetRecord]) -> Vec<TrendPoint> {
        let mut order: Vec<Uuid> = Vec::new();
        let mut best: BTreeMap<Uuid, &SetRecord> = BTreeMap::new();

        for set in sets
            .iter()
            .filter(|s| s.exercise_id == exercise_id && s.is_working_set())
        {
            // Ties keep the earlier set
            let replace = match best.get(&set.session_id) {
                Some(current) => set.volume() > current.volume(),
                None => {
                    order.push(set.session_id);
                    true
                }
            };

            if replace {
                best.insert(set.session_id, set);
            }
        }

        let mut points: Vec<TrendPoint> = order
            .iter()
            .filter_map(|id| best.get(id))
            .map(|set| TrendPoint {
                date: set.session_date,
                session_id: set.session_id,
                weight: set.weight,
                reps: set.reps,
                volume: set.volume(),
                estimated_one_rep_max: estimated_one_rep_max(set.weight, set.reps),
            })
            .collect();

        points.sort_by_key(|p| p.date);
        points
    }

    fn weekly_rollup(points: &[TrendPoint]) -> Vec<WeeklyProgress> {
        let mut weeks: BTreeMap<_, WeeklyProgress> = BTreeMap::new();

        for point in points {
            let key = week_start(point.date.date_naive());
            let week = weeks.entry(key).or_insert_with(|| WeeklyProgress {
                week_start: key,
                max_weight: 0.0,
                max_reps: 0,
                max_volume: 0.0,
                max_one_rep_max: 0.0,
                sessions: 0,
            });

            week.max_weight = week.max_weight.max(point.weight);
            week.max_reps = week.max_reps.max(point.reps);
            week.max_volume = week.max_volume.max(point.volume);
            week.max_one_rep_max = week.max_one_rep_max.max(point.estimated_one_rep_max);
            week.sessions += 1;
        }

        weeks.into_values().collect()
    }

    fn classify_trend(&self, slopes: &ProgressionSlopes) -> ProgressionTrend {
        let avg = (slopes.volume + slopes.one_rep_max) / 2.0;

        if avg.abs() < self.thresholds.stable_slope {
            ProgressionTrend::Stable
        } else if avg > self.thresholds.strong_slope {
            ProgressionTrend::Improving
        } else if avg > 0.0 {
            ProgressionTrend::SlightlyImproving
        } else if avg < -self.thresholds.strong_slope {
            ProgressionTrend::Declining
        } else {
            ProgressionTrend::SlightlyDeclining
        }
    }

    /// Extrapolates the estimated 1RM from the slope of the most recent sessions
    fn project(&self, points: &[TrendPoint]) -> Option<Projections> {
        if points.len() < self.thresholds.min_points {
            return None;
        }

        let recent = &points[points.len().saturating_sub(self.thresholds.projection_window)..];
        let recent_maxes: Vec<f64> = recent.iter().map(|p| p.estimated_one_rep_max).collect();
        let recent_volumes: Vec<f64> = recent.iter().map(|p| p.volume).collect();

        let slope = linear_trend(&recent_maxes);
        let current = recent_maxes.last().copied()?;

        Some(Projections {
            next_month: (current + slope * self.thresholds.next_month_steps).round(),
            next_quarter: (current + slope * self.thresholds.next_quarter_steps).round(),
            confidence: round_to(consistency_score(&recent_volumes), 2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRecordStore;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    const EXERCISE: Uuid = Uuid::from_u128(0xbe9c);

    fn service() -> ProgressionService {
        ProgressionService::new(
            Arc::new(InMemoryRecordStore::default()),
            ProgressionThresholds::default(),
        )
    }

    fn set(session: u128, day: i64, order: u32, weight: f64, reps: u32) -> SetRecord {
        SetRecord {
            exercise_id: EXERCISE,
            exercise_name: "Bench Press".to_string(),
            muscle_group_category: "Chest".to_string(),
            weight,
            reps,
            is_warmup: false,
            is_completed: true,
            session_id: Uuid::from_u128(session),
            session_date: Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap() + Duration::days(day),
            set_order: order,
        }
    }

    #[test]
    fn test_best_sets_scenario() {
        let report = service().build_report(
            EXERCISE,
            &[
                set(1, 0, 1, 100.0, 10),
                set(2, 3, 1, 105.0, 8),
                set(3, 7, 1, 110.0, 6),
            ],
        );

        let maxes: Vec<f64> = report.best_sets.iter().map(|p| p.estimated_one_rep_max).collect();
        assert_eq!(maxes, vec![133.0, 133.0, 132.0]);
        assert_eq!(report.total_sessions, 3);
        assert_eq!(report.current_one_rep_max, 132.0);
        assert_eq!(report.exercise_name.as_deref(), Some("Bench Press"));
        assert!(report.slopes.weight > 0.0);
        assert!(report.slopes.one_rep_max <= 0.0);
        assert_eq!(report.trend, ProgressionTrend::Declining);
        assert_eq!(report.weight_change_percent, 10.0);
        assert!(report.projections.is_some());
    }

    #[test]
    fn test_best_set_selected_per_session() {
        let report = service().build_report(
            EXERCISE,
            &[
                set(1, 0, 1, 60.0, 10),
                set(1, 0, 2, 100.0, 8),
                set(1, 0, 3, 100.0, 6),
            ],
        );

        assert_eq!(report.best_sets.len(), 1);
        assert_eq!(report.best_sets[0].weight, 100.0);
        assert_eq!(report.best_sets[0].reps, 8);
        assert_eq!(report.consistency_score, 0.0);
        assert_eq!(report.projections, None);
        assert_eq!(report.volume_change_percent, 0.0);
    }

    #[test]
    fn test_no_sets_is_insufficient_data() {
        let report = service().build_report(EXERCISE, &[]);
        assert_eq!(report.trend, ProgressionTrend::InsufficientData);
        assert!(report.best_sets.is_empty());
        assert_eq!(report.projections, None);
    }

    #[test]
    fn test_warmups_do_not_count() {
        let mut warmup = set(1, 0, 1, 60.0, 10);
        warmup.is_warmup = true;

        let report = service().build_report(EXERCISE, &[warmup]);
        assert_eq!(report.trend, ProgressionTrend::InsufficientData);
    }

    #[test]
    fn test_trend_classification_bands() {
        let service = service();
        let classify = |volume: f64, one_rep_max: f64| {
            service.classify_trend(&ProgressionSlopes {
                volume,
                one_rep_max,
                weight: 0.0,
            })
        };

        assert_eq!(classify(0.05, 0.0), ProgressionTrend::Stable);
        assert_eq!(classify(2.0, 1.0), ProgressionTrend::Improving);
        assert_eq!(classify(0.6, 0.2), ProgressionTrend::SlightlyImproving);
        assert_eq!(classify(-2.0, -1.0), ProgressionTrend::Declining);
        assert_eq!(classify(-0.6, -0.2), ProgressionTrend::SlightlyDeclining);
    }

    #[test]
    fn test_projection_uses_recent_window() {
        // Early sessions are flat, last five climb by 5kg each
        let mut sets = vec![set(1, 0, 1, 100.0, 5), set(2, 2, 1, 100.0, 5)];
        for i in 0..5u128 {
            let weight = 100.0 + 5.0 * (i as f64 + 1.0);
            sets.push(set(10 + i, 4 + 2 * i as i64, 1, weight, 5));
        }

        let report = service().build_report(EXERCISE, &sets);
        let projections = report.projections.unwrap();

        // Epley at 5 reps: +5kg is about +5.83 per session
        assert!(projections.next_month > report.current_one_rep_max + 20.0);
        assert!(projections.next_quarter > projections.next_month);
        assert!(projections.confidence > 0.0 && projections.confidence <= 100.0);
    }

    #[test]
    fn test_weekly_rollup_keeps_maxima() {
        let report = service().build_report(
            EXERCISE,
            &[
                // 2024-01-01 is a Monday
                set(1, 0, 1, 100.0, 5),
                set(2, 2, 1, 90.0, 10),
                set(3, 8, 1, 110.0, 3),
            ],
        );

        assert_eq!(report.weekly_progress.len(), 2);
        let first = &report.weekly_progress[0];
        assert_eq!(first.max_weight, 100.0);
        assert_eq!(first.max_reps, 10);
        assert_eq!(first.max_volume, 900.0);
        assert_eq!(first.sessions, 2);
    }

    #[tokio::test]
    async fn test_nil_exercise_is_invalid() {
        let window = AnalysisWindow::last_days(90).unwrap();
        let result = service().analyze(Uuid::nil(), &window).await;
        assert_matches!(result, Err(AnalyticsError::InvalidArgument(_)));
    }

    proptest! {
        #[test]
        fn prop_increasing_load_never_declines(
            start in 20.0f64..200.0,
            steps in proptest::collection::vec(1.0f64..10.0, 2..12),
            reps in 3u32..12,
        ) {
            let mut weight = start;
            let mut sets = vec![set(0, 0, 1, weight, reps)];
            for (i, step) in steps.iter().enumerate() {
                weight += step;
                sets.push(set(i as u128 + 1, i as i64 + 1, 1, weight, reps));
            }

            let report = service().build_report(EXERCISE, &sets);
            prop_assert!(matches!(
                report.trend,
                ProgressionTrend::Improving | ProgressionTrend::SlightlyImproving
            ));
        }

        #[test]
        fn prop_added_reps_never_decline(
            weight in 20.0f64..200.0,
            start_reps in 1u32..8,
            steps in proptest::collection::vec((1u32..4, 0.0f64..5.0), 2..12),
        ) {
            let mut load = weight;
            let mut reps = start_reps;
            let mut sets = vec![set(0, 0, 1, load, reps)];
            for (i, (extra_reps, extra_load)) in steps.iter().enumerate() {
                reps += extra_reps;
                load += extra_load;
                sets.push(set(i as u128 + 1, i as i64 + 1, 1, load, reps));
            }

            let report = service().build_report(EXERCISE, &sets);
            prop_assert!(!matches!(
                report.trend,
                ProgressionTrend::Declining | ProgressionTrend::SlightlyDeclining
            ));
            prop_assert!(report.slopes.volume > 0.0);
        }
    }
}
