use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::FrequencyThresholds;
use crate::errors::{AnalyticsError, AnalyticsResult};
use crate::models::{
    AnalysisWindow, DailyActivity, FrequencyReport, SessionFilter, SessionRecord, SetFilter,
    WeeklyFrequency,
};
use crate::services::statistics::{consistency_score, mean, round_to, week_start};
use crate::storage::RecordStore;

/// Workout frequency, consistency and streaks
#[derive(Clone)]
pub struct FrequencyService {
    store: Arc<dyn RecordStore>,
    thresholds: FrequencyThresholds,
}

impl FrequencyService {
    pub fn new(store: Arc<dyn RecordStore>, thresholds: FrequencyThresholds) -> Self {
        Self { store, thresholds }
    }

    pub async fn analyze(&self, window: &AnalysisWindow) -> AnalyticsResult<FrequencyReport> {
        info!("Analyzing workout frequency over {:?} days", window.timeframe_days);

        let sessions = match self.store.list_sessions(&SessionFilter::completed(window)).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("{}", AnalyticsError::data_unavailable("Frequency", &e));
                return Ok(FrequencyReport::empty());
            }
        };

        let set_counts = if sessions.iter().any(|s| s.set_count.is_none()) {
            self.derive_set_counts(window).await
        } else {
            HashMap::new()
        };

        Ok(self.build_report(&sessions, &set_counts, window))
    }

    /// Working sets per session, for stores that do not pre-aggregate them
    async fn derive_set_counts(&self, window: &AnalysisWindow) -> HashMap<Uuid, u32> {
        match self.store.list_sets(&SetFilter::working_sets(window)).await {
            Ok(sets) => sets
                .iter()
                .filter(|s| s.is_working_set())
                .fold(HashMap::new(), |mut counts, set| {
                    *counts.entry(set.session_id).or_insert(0) += 1;
                    counts
                }),
            Err(e) => {
                warn!("{}, set counts left at 0", AnalyticsError::data_unavailable("Frequency set counts", &e));
                HashMap::new()
            }
        }
    }

    pub fn build_report(
        &self,
        sessions: &[SessionRecord],
        set_counts: &HashMap<Uuid, u32>,
        window: &AnalysisWindow,
    ) -> FrequencyReport {
        let completed: Vec<&SessionRecord> = sessions.iter().filter(|s| s.is_completed).collect();
        if completed.is_empty() {
            return FrequencyReport::empty();
        }

        let mut daily: BTreeMap<NaiveDate, DailyActivity> = BTreeMap::new();
        for session in &completed {
            let date = session.date.date_naive();
            let day = daily.entry(date).or_insert_with(|| DailyActivity {
                date,
                sessions: 0,
                duration_minutes: 0.0,
                set_count: 0,
            });
            day.sessions += 1;
            day.duration_minutes += session.duration_seconds as f64 / 60.0;
            day.set_count += session
                .set_count
                .or_else(|| set_counts.get(&session.session_id).copied())
                .unwrap_or(0);
        }

        let mut weekly: BTreeMap<NaiveDate, WeeklyFrequency> = BTreeMap::new();
        for day in daily.values() {
            let key = week_start(day.date);
            let week = weekly.entry(key).or_insert_with(|| WeeklyFrequency {
                week_start: key,
                workouts: 0,
                workout_days: 0,
                duration_minutes: 0.0,
            });
            week.workouts += day.sessions;
            week.workout_days += 1;
            week.duration_minutes += day.duration_minutes;
        }

        let days: Vec<NaiveDate> = daily.keys().copied().collect();
        let workout_days = days.len() as u32;

        let days_since_first = days
            .first()
            .map(|first| (window.today() - *first).num_days())
            .unwrap_or(0)
            .max(1);
        let avg_workouts_per_week = round_to(workout_days as f64 / days_since_first as f64 * 7.0, 2);

        let durations: Vec<f64> = completed
            .iter()
            .filter(|s| s.duration_seconds > 0)
            .map(|s| s.duration_seconds as f64 / 60.0)
            .collect();
        let avg_duration_minutes = round_to(mean(&durations), 1);

        let weekly_counts: Vec<f64> = weekly.values().map(|w| w.workouts as f64).collect();
        let consistency_score = round_to(consistency_score(&weekly_counts), 2);

        let longest_streak = self.longest_streak(&days);
        let current_streak = self.current_streak(&days, window.today());

        debug!(
            "Frequency: {} workout days, longest streak {}, current streak {}",
            workout_days, longest_streak, current_streak
        );

        let mut report = FrequencyReport {
            total_workouts: completed.len() as u32,
            workout_days,
            avg_workouts_per_week,
            avg_duration_minutes,
            consistency_score,
            longest_streak,
            current_streak,
            daily: daily.into_values().collect(),
            weekly: weekly.into_values().collect(),
            recommendations: Vec::new(),
        };
        report.recommendations = self.generate_recommendations(&report, window.today());
        report
    }

    /// Longest run of workout days where consecutive days are at most
    /// `streak_gap_days` apart. `days` must be sorted and distinct.
    pub fn longest_streak(&self, days: &[NaiveDate]) -> u32 {
        if days.is_empty() {
            return 0;
        }

        let mut longest = 1;
        let mut current = 1;
        for pair in days.windows(2) {
            if (pair[1] - pair[0]).num_days() <= self.thresholds.streak_gap_days {
                current += 1;
            } else {
                current = 1;
            }
            longest = longest.max(current);
        }

        longest
    }

    /// Length of the run ending at the most recent workout day.
    ///
    /// Broken (0) when the last workout is more than
    /// `current_streak_cutoff_days` before `today`. A lone workout day with no
    /// linked neighbour is not a streak yet and also reports 0.
    pub fn current_streak(&self, days: &[NaiveDate], today: NaiveDate) -> u32 {
        let Some(last) = days.last() else {
            return 0;
        };

        if (today - *last).num_days() > self.thresholds.current_streak_cutoff_days {
            return 0;
        }

        let mut streak = 1;
        for pair in days.windows(2).rev() {
            if (pair[1] - pair[0]).num_days() <= self.thresholds.streak_gap_days {
                streak += 1;
            } else {
                break;
            }
        }

        if streak < 2 {
            0
        } else {
            streak
        }
    }

    fn generate_recommendations(&self, report: &FrequencyReport, today: NaiveDate) -> Vec<String> {
        let t = &self.thresholds;
        let mut recommendations = Vec::new();
        let frequency = report.avg_workouts_per_week;

        if frequency < t.low_frequency {
            recommendations.push("Aim for at least 2-3 workouts per week to build momentum.".to_string());
        } else if frequency >= t.ideal_min_frequency && frequency <= t.ideal_max_frequency {
            recommendations.push("Great frequency! 3-5 workouts per week is ideal for steady progress.".to_string());
        } else if frequency > t.high_frequency {
            recommendations.push("You are training very frequently. Make sure to schedule recovery days.".to_string());
        }

        if report.consistency_score < t.low_consistency {
            recommendations.push("Try to keep a more regular weekly schedule to improve consistency.".to_string());
        } else if report.consistency_score > t.high_consistency {
            recommendations.push("Excellent consistency! Keep up the routine.".to_string());
        }

        if report.avg_duration_minutes > 0.0 && report.avg_duration_minutes < t.short_duration_minutes {
            recommendations.push("Consider longer sessions of 30 minutes or more for better results.".to_string());
        } else if report.avg_duration_minutes > t.long_duration_minutes {
            recommendations.push("Your sessions are long. Consider splitting them into shorter, focused workouts.".to_string());
        }

        // A first workout today is the start of a streak, not a lapse
        let trained_today = report.daily.last().is_some_and(|d| d.date == today);

        if report.current_streak == 0 && !trained_today {
            recommendations.push("Start a new streak today! Every workout counts.".to_string());
        } else if report.current_streak >= t.long_streak {
            recommendations.push(format!(
                "Amazing {}-day streak! Remember to schedule a rest day.",
                report.current_streak
            ));
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRecordStore;
    use chrono::{Duration, TimeZone, Utc};

    fn service() -> FrequencyService {
        FrequencyService::new(
            Arc::new(InMemoryRecordStore::default()),
            FrequencyThresholds::default(),
        )
    }

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(n - 1)
    }

    fn session(n: i64, minutes: u32) -> SessionRecord {
        SessionRecord {
            session_id: Uuid::from_u128(n as u128),
            user_id: Uuid::nil(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap() + Duration::days(n - 1),
            duration_seconds: minutes * 60,
            is_completed: true,
            set_count: Some(12),
            exercise_count: Some(4),
        }
    }

    fn window_at(n: i64) -> AnalysisWindow {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap() + Duration::days(n - 1);
        AnalysisWindow::ending_at(now, 90).unwrap()
    }

    #[test]
    fn test_streaks_with_gaps() {
        let service = service();
        let days: Vec<NaiveDate> = [1, 2, 4, 5, 8].iter().map(|&n| day(n)).collect();

        assert_eq!(service.longest_streak(&days), 4);
        assert_eq!(service.current_streak(&days, day(9)), 0);
    }

    #[test]
    fn test_current_streak_active() {
        let service = service();
        let days: Vec<NaiveDate> = [1, 5, 6, 8, 10].iter().map(|&n| day(n)).collect();

        assert_eq!(service.current_streak(&days, day(11)), 4);
        assert_eq!(service.current_streak(&days, day(13)), 4);
        assert_eq!(service.current_streak(&days, day(14)), 0);
    }

    #[test]
    fn test_streaks_empty() {
        let service = service();
        assert_eq!(service.longest_streak(&[]), 0);
        assert_eq!(service.current_streak(&[], day(1)), 0);
        assert_eq!(service.longest_streak(&[day(3)]), 1);
    }

    #[test]
    fn test_no_sessions_is_empty_report() {
        let report = service().build_report(&[], &HashMap::new(), &window_at(10));
        assert_eq!(report, FrequencyReport::empty());
    }

    #[test]
    fn test_frequency_metrics() {
        // Mon/Wed/Fri for two weeks, "now" is the following Monday
        let sessions: Vec<SessionRecord> = [1, 3, 5, 8, 10, 12].iter().map(|&n| session(n, 60)).collect();
        let report = service().build_report(&sessions, &HashMap::new(), &window_at(15));

        assert_eq!(report.total_workouts, 6);
        assert_eq!(report.workout_days, 6);
        assert_eq!(report.avg_workouts_per_week, 3.0);
        assert_eq!(report.avg_duration_minutes, 60.0);
        assert_eq!(report.consistency_score, 100.0);
        // Friday to Monday is a three day gap
        assert_eq!(report.longest_streak, 3);
        assert_eq!(report.current_streak, 3);
        assert_eq!(report.weekly.len(), 2);
        assert_eq!(report.daily[0].set_count, 12);

        assert!(report.recommendations.iter().any(|r| r.contains("Great frequency")));
        assert!(report.recommendations.iter().any(|r| r.contains("Excellent consistency")));
    }

    #[test]
    fn test_derived_set_counts_and_short_sessions() {
        let mut first = session(1, 20);
        first.set_count = None;
        let mut counts = HashMap::new();
        counts.insert(first.session_id, 7);

        let report = service().build_report(&[first], &counts, &window_at(20));

        assert_eq!(report.daily[0].set_count, 7);
        assert_eq!(report.current_streak, 0);
        assert!(report.recommendations.iter().any(|r| r.contains("longer sessions")));
        assert!(report.recommendations.iter().any(|r| r.contains("new streak")));
    }

    #[test]
    fn test_low_frequency_and_irregular_weeks() {
        // Three sessions in the first week, one two weeks later
        let sessions: Vec<SessionRecord> = [1, 2, 3, 15].iter().map(|&n| session(n, 45)).collect();
        let report = service().build_report(&sessions, &HashMap::new(), &window_at(29));

        assert_eq!(report.avg_workouts_per_week, 1.0);
        assert_eq!(report.consistency_score, 50.0);
        assert!(report.recommendations.iter().any(|r| r.contains("at least 2-3 workouts")));
        assert!(report.recommendations.iter().any(|r| r.contains("more regular weekly schedule")));
        assert!(!report.recommendations.iter().any(|r| r.contains("Excellent consistency")));
    }

    #[test]
    fn test_first_workout_today_skips_streak_nudge() {
        let report = service().build_report(&[session(10, 45)], &HashMap::new(), &window_at(10));

        assert_eq!(report.current_streak, 0);
        assert!(!report.recommendations.iter().any(|r| r.contains("new streak")));

        let lapsed = service().build_report(&[session(10, 45)], &HashMap::new(), &window_at(11));
        assert!(lapsed.recommendations.iter().any(|r| r.contains("new streak")));
    }

    #[test]
    fn test_long_streak_suggests_rest() {
        let sessions: Vec<SessionRecord> = (1..=8).map(|n| session(n, 150)).collect();
        let report = service().build_report(&sessions, &HashMap::new(), &window_at(8));

        assert_eq!(report.current_streak, 8);
        assert!(report.avg_workouts_per_week > 6.0);
        assert!(report.recommendations.iter().any(|r| r.contains("rest day")));
        assert!(report.recommendations.iter().any(|r| r.contains("splitting")));
        assert!(report.recommendations.iter().any(|r| r.contains("recovery days")));
    }

    #[tokio::test]
    async fn test_analyze_derives_set_counts_from_store() {
        let mut uncounted = session(2, 45);
        uncounted.set_count = None;

        let sets = vec![crate::models::SetRecord {
            exercise_id: Uuid::from_u128(77),
            exercise_name: "Row".to_string(),
            muscle_group_category: "Back".to_string(),
            weight: 60.0,
            reps: 10,
            is_warmup: false,
            is_completed: true,
            session_id: uncounted.session_id,
            session_date: uncounted.date,
            set_order: 1,
        }];

        let store = InMemoryRecordStore::new(vec![uncounted], sets);
        let service = FrequencyService::new(Arc::new(store), FrequencyThresholds::default());
        let report = service.analyze(&window_at(3)).await.unwrap();

        assert_eq!(report.daily[0].set_count, 1);
    }
}
