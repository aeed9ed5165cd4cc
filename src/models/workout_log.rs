use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AnalyticsError, AnalyticsResult};

/// A single logged set, flattened with its exercise and session context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub muscle_group_category: String,
    pub weight: f64,
    pub reps: u32,
    #[serde(default)]
    pub is_warmup: bool,
    #[serde(default = "default_true")]
    pub is_completed: bool,
    pub session_id: Uuid,
    pub session_date: DateTime<Utc>,
    #[serde(default)]
    pub set_order: u32,
}

impl SetRecord {
    /// Completed, non-warmup, with positive weight and reps
    pub fn is_working_set(&self) -> bool {
        self.is_completed && !self.is_warmup && self.weight > 0.0 && self.reps > 0
    }

    pub fn volume(&self) -> f64 {
        self.weight * self.reps as f64
    }

    pub fn day(&self) -> NaiveDate {
        self.session_date.date_naive()
    }
}

/// A logged workout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub duration_seconds: u32,
    #[serde(default = "default_true")]
    pub is_completed: bool,
    // Aggregates the store may pre-compute; derived from the set log when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_count: Option<u32>,
}

fn default_true() -> bool {
    true
}

/// Filter criteria for set queries
#[derive(Debug, Clone, Default)]
pub struct SetFilter {
    pub exercise_id: Option<Uuid>,
    pub muscle_group_category: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub only_completed: bool,
    pub exclude_warmup: bool,
}

impl SetFilter {
    /// Completed, non-warmup sets since the window start
    pub fn working_sets(window: &AnalysisWindow) -> Self {
        Self {
            since: window.since,
            only_completed: true,
            exclude_warmup: true,
            ..Default::default()
        }
    }

    pub fn for_exercise(mut self, exercise_id: Uuid) -> Self {
        self.exercise_id = Some(exercise_id);
        self
    }

    pub fn matches(&self, set: &SetRecord) -> bool {
        if let Some(exercise_id) = self.exercise_id {
            if set.exercise_id != exercise_id {
                return false;
            }
        }

        if let Some(ref category) = self.muscle_group_category {
            if &set.muscle_group_category != category {
                return false;
            }
        }

        if let Some(since) = self.since {
            if set.session_date < since {
                return false;
            }
        }

        if self.only_completed && !set.is_completed {
            return false;
        }

        if self.exclude_warmup && set.is_warmup {
            return false;
        }

        true
    }
}

/// Filter criteria for session queries
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub since: Option<DateTime<Utc>>,
    pub only_completed: bool,
}

impl SessionFilter {
    pub fn completed(window: &AnalysisWindow) -> Self {
        Self {
            since: window.since,
            only_completed: true,
        }
    }

    pub fn matches(&self, session: &SessionRecord) -> bool {
        if let Some(since) = self.since {
            if session.date < since {
                return false;
            }
        }

        !(self.only_completed && !session.is_completed)
    }
}

/// Time window an analysis runs over.
///
/// `now` is fixed when the window is built so that recency, streak and
/// projection calculations are reproducible for a given input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisWindow {
    pub timeframe_days: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

impl AnalysisWindow {
    /// Window covering the last `timeframe_days` days before `now`
    pub fn ending_at(now: DateTime<Utc>, timeframe_days: i64) -> AnalyticsResult<Self> {
        if timeframe_days <= 0 {
            return Err(AnalyticsError::invalid_argument(format!(
                "timeframe must be a positive number of days, got {}",
                timeframe_days
            )));
        }

        let since = Duration::try_days(timeframe_days)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| {
                AnalyticsError::invalid_argument(format!(
                    "timeframe of {} days reaches beyond the supported date range",
                    timeframe_days
                ))
            })?;

        Ok(Self {
            timeframe_days: Some(timeframe_days),
            since: Some(since),
            now,
        })
    }

    pub fn last_days(timeframe_days: i64) -> AnalyticsResult<Self> {
        Self::ending_at(Utc::now(), timeframe_days)
    }

    /// The whole log, with `now` as reference instant
    pub fn all_time(now: DateTime<Utc>) -> Self {
        Self {
            timeframe_days: None,
            since: None,
            now,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}
