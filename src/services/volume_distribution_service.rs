use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::VolumeThresholds;
use crate::errors::{AnalyticsError, AnalyticsResult};
use crate::models::{
    AnalysisWindow, ExerciseVolume, SetFilter, SetRecord, VolumeDistributionReport, WeeklyVolume,
};
use crate::services::statistics::{
    consistency_score_min, linear_trend, mean, percent_change, percentage, round_to, week_start,
};
use crate::storage::RecordStore;

/// Weekly and per-exercise breakdown of training volume
#[derive(Clone)]
pub struct VolumeDistributionService {
    store: Arc<dyn RecordStore>,
    thresholds: VolumeThresholds,
}

/// One exercise on one day
#[derive(Debug, Default)]
struct DailyExerciseVolume {
    volume: f64,
    sets: u32,
    weight_sum: f64,
    reps_sum: u64,
}

#[derive(Default)]
struct WeekTotals {
    volume: f64,
    sets: u32,
    days: BTreeSet<NaiveDate>,
    exercises: BTreeSet<Uuid>,
    categories: BTreeMap<String, f64>,
}

struct ExerciseTotals<'a> {
    name: &'a str,
    category: &'a str,
    volume: f64,
    sets: u32,
    weight_sum: f64,
    reps_sum: u64,
    days: BTreeSet<NaiveDate>,
}

impl VolumeDistributionService {
    pub fn new(store: Arc<dyn RecordStore>, thresholds: VolumeThresholds) -> Self {
        Self { store, thresholds }
    }

    pub async fn analyze(&self, window: &AnalysisWindow) -> AnalyticsResult<VolumeDistributionReport> {
        info!("Analyzing volume distribution over {:?} days", window.timeframe_days);

        let sets = match self.store.list_sets(&SetFilter::working_sets(window)).await {
            Ok(sets) => sets,
            Err(e) => {
                warn!("{}", AnalyticsError::data_unavailable("Volume distribution", &e));
                return Ok(VolumeDistributionReport::empty());
            }
        };

        Ok(self.build_report(&sets))
    }

    pub fn build_report(&self, sets: &[SetRecord]) -> VolumeDistributionReport {
        let working: Vec<&SetRecord> = sets.iter().filter(|s| s.is_working_set()).collect();
        if working.is_empty() {
            return VolumeDistributionReport::empty();
        }

        // Per-day, per-exercise aggregation first; weeks and exercises fold from it
        let mut daily: BTreeMap<(NaiveDate, Uuid), DailyExerciseVolume> = BTreeMap::new();
        let mut catalog: BTreeMap<Uuid, &SetRecord> = BTreeMap::new();

        for set in &working {
            let entry = daily.entry((set.day(), set.exercise_id)).or_default();
            entry.volume += set.volume();
            entry.sets += 1;
            entry.weight_sum += set.weight;
            entry.reps_sum += set.reps as u64;
            catalog.entry(set.exercise_id).or_insert(*set);
        }

        debug!("Volume aggregated into {} exercise-days", daily.len());

        let weekly = Self::weekly_buckets(&daily, &catalog);
        let total_volume: f64 = weekly.iter().map(|w| w.total_volume).sum();
        let exercise_distribution = Self::exercise_distribution(&daily, &catalog, total_volume);

        let weekly_totals: Vec<f64> = weekly.iter().map(|w| w.total_volume).collect();
        let volume_trend = round_to(linear_trend(&weekly_totals), 2);
        let volume_change_percent = round_to(percent_change(&weekly_totals), 2);
        let consistency_score = round_to(
            consistency_score_min(&weekly_totals, self.thresholds.min_weeks_for_consistency),
            2,
        );
        let workout_days: Vec<f64> = weekly.iter().map(|w| w.workout_days as f64).collect();
        let avg_workouts_per_week = round_to(mean(&workout_days), 2);

        let mut report = VolumeDistributionReport {
            weekly,
            exercise_distribution,
            total_volume,
            volume_trend,
            volume_change_percent,
            consistency_score,
            avg_workouts_per_week,
            insights: Vec::new(),
        };
        report.insights = self.generate_insights(&report);
        report
    }

    fn weekly_buckets(
        daily: &BTreeMap<(NaiveDate, Uuid), DailyExerciseVolume>,
        catalog: &BTreeMap<Uuid, &SetRecord>,
    ) -> Vec<WeeklyVolume> {
        let mut weeks: BTreeMap<NaiveDate, WeekTotals> = BTreeMap::new();

        for ((day, exercise_id), volume) in daily {
            let week = weeks.entry(week_start(*day)).or_default();
            week.volume += volume.volume;
            week.sets += volume.sets;
            week.days.insert(*day);
            week.exercises.insert(*exercise_id);

            if let Some(set) = catalog.get(exercise_id) {
                *week
                    .categories
                    .entry(set.muscle_group_category.clone())
                    .or_insert(0.0) += volume.volume;
            }
        }

        weeks
            .into_iter()
            .map(|(week_start, totals)| {
                let workout_days = totals.days.len() as u32;
                WeeklyVolume {
                    week_start,
                    total_volume: totals.volume,
                    total_sets: totals.sets,
                    workout_days,
                    exercise_count: totals.exercises.len() as u32,
                    avg_volume_per_workout: if workout_days > 0 {
                        round_to(totals.volume / workout_days as f64, 2)
                    } else {
                        0.0
                    },
                    category_breakdown: totals.categories,
                }
            })
            .collect()
    }

    fn exercise_distribution(
        daily: &BTreeMap<(NaiveDate, Uuid), DailyExerciseVolume>,
        catalog: &BTreeMap<Uuid, &SetRecord>,
        total_volume: f64,
    ) -> Vec<ExerciseVolume> {
        let mut exercises: BTreeMap<Uuid, ExerciseTotals> = BTreeMap::new();

        for ((day, exercise_id), volume) in daily {
            let Some(set) = catalog.get(exercise_id) else {
                continue;
            };

            let entry = exercises.entry(*exercise_id).or_insert_with(|| ExerciseTotals {
                name: &set.exercise_name,
                category: &set.muscle_group_category,
                volume: 0.0,
                sets: 0,
                weight_sum: 0.0,
                reps_sum: 0,
                days: BTreeSet::new(),
            });
            entry.volume += volume.volume;
            entry.sets += volume.sets;
            entry.weight_sum += volume.weight_sum;
            entry.reps_sum += volume.reps_sum;
            entry.days.insert(*day);
        }

        let mut distribution: Vec<ExerciseVolume> = exercises
            .into_iter()
            .map(|(exercise_id, totals)| ExerciseVolume {
                exercise_id,
                exercise_name: totals.name.to_string(),
                muscle_group_category: totals.category.to_string(),
                total_volume: totals.volume,
                total_sets: totals.sets,
                workout_days: totals.days.len() as u32,
                avg_weight: round_to(totals.weight_sum / totals.sets as f64, 2),
                avg_reps: round_to(totals.reps_sum as f64 / totals.sets as f64, 2),
                percentage: round_to(percentage(totals.volume, total_volume), 2),
            })
            .collect();

        distribution.sort_by(|a, b| {
            b.total_volume
                .total_cmp(&a.total_volume)
                .then_with(|| a.exercise_name.cmp(&b.exercise_name))
        });

        distribution
    }

    fn generate_insights(&self, report: &VolumeDistributionReport) -> Vec<String> {
        let t = &self.thresholds;
        let mut insights = Vec::new();

        if report.volume_change_percent > t.increase_percent {
            insights.push(format!(
                "Your weekly training volume increased by {:.1}%. Great progressive overload!",
                report.volume_change_percent
            ));
        } else if report.volume_change_percent < t.decrease_percent {
            insights.push(format!(
                "Your weekly training volume decreased by {:.1}%. Make sure this is a planned deload.",
                report.volume_change_percent.abs()
            ));
        }

        if report.weekly.len() >= t.min_weeks_for_consistency {
            if report.consistency_score > t.high_consistency {
                insights.push(format!(
                    "Excellent week-to-week volume consistency ({:.0}/100).",
                    report.consistency_score
                ));
            } else if report.consistency_score < t.low_consistency {
                insights.push(format!(
                    "Your weekly volume varies a lot ({:.0}/100). Aim for a steadier training load.",
                    report.consistency_score
                ));
            }
        }

        if report.avg_workouts_per_week < t.low_frequency {
            insights.push("Try to increase your training frequency to at least 2 workouts per week.".to_string());
        } else if report.avg_workouts_per_week > t.high_frequency {
            insights.push("You are training more than 6 days a week. Ensure you are getting enough recovery.".to_string());
        }

        let top: Vec<&str> = report
            .exercise_distribution
            .iter()
            .take(t.top_exercises)
            .map(|e| e.exercise_name.as_str())
            .collect();
        if !top.is_empty() {
            insights.push(format!("Top exercises by volume: {}", top.join(", ")));
        }

        insights
    }
}
