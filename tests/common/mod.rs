// Shared fixtures for integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use workout_analytics::models::{SessionFilter, SessionRecord, SetFilter, SetRecord};
use workout_analytics::storage::{InMemoryRecordStore, RecordLog, RecordStore};

#[derive(Debug, Clone, Copy)]
pub struct Exercise {
    pub id: Uuid,
    pub name: &'static str,
    pub category: &'static str,
}

pub const BENCH_PRESS: Exercise = Exercise {
    id: Uuid::from_u128(0xb0_01),
    name: "Bench Press",
    category: "Chest",
};
pub const BARBELL_ROW: Exercise = Exercise {
    id: Uuid::from_u128(0xb0_02),
    name: "Barbell Row",
    category: "Back",
};
pub const SQUAT: Exercise = Exercise {
    id: Uuid::from_u128(0xb0_03),
    name: "Squat",
    category: "Legs",
};
pub const DEADLIFT: Exercise = Exercise {
    id: Uuid::from_u128(0xb0_04),
    name: "Deadlift",
    category: "Back",
};
pub const OVERHEAD_PRESS: Exercise = Exercise {
    id: Uuid::from_u128(0xb0_05),
    name: "Overhead Press",
    category: "Shoulders",
};

/// Saturday noon, the reference instant for deterministic tests
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 8, 12, 0, 0).unwrap()
}

/// Builds a workout log relative to a reference instant
pub struct LogBuilder {
    now: DateTime<Utc>,
    user_id: Uuid,
    sessions: Vec<SessionRecord>,
    sets: Vec<SetRecord>,
    next_session: u128,
}

impl LogBuilder {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            user_id: Uuid::from_u128(42),
            sessions: Vec::new(),
            sets: Vec::new(),
            next_session: 1,
        }
    }

    /// Log a completed session `days_ago`, three working sets per lift
    pub fn session(mut self, days_ago: i64, minutes: u32, lifts: &[(Exercise, f64, u32)]) -> Self {
        let session_id = Uuid::from_u128(0x5e55_0000 + self.next_session);
        self.next_session += 1;

        let date = (self.now - Duration::days(days_ago))
            .date_naive()
            .and_hms_opt(18, 0, 0)
            .unwrap()
            .and_utc();

        let mut order = 0;
        for (exercise, weight, reps) in lifts {
            for _ in 0..3 {
                order += 1;
                self.sets.push(SetRecord {
                    exercise_id: exercise.id,
                    exercise_name: exercise.name.to_string(),
                    muscle_group_category: exercise.category.to_string(),
                    weight: *weight,
                    reps: *reps,
                    is_warmup: false,
                    is_completed: true,
                    session_id,
                    session_date: date,
                    set_order: order,
                });
            }
        }

        self.sessions.push(SessionRecord {
            session_id,
            user_id: self.user_id,
            date,
            duration_seconds: minutes * 60,
            is_completed: true,
            set_count: None,
            exercise_count: Some(lifts.len() as u32),
        });

        self
    }

    /// Append a set to the most recent session without marking it completed
    pub fn abandoned_set(mut self, exercise: Exercise, weight: f64, reps: u32) -> Self {
        if let Some(last) = self.sessions.last() {
            self.sets.push(SetRecord {
                exercise_id: exercise.id,
                exercise_name: exercise.name.to_string(),
                muscle_group_category: exercise.category.to_string(),
                weight,
                reps,
                is_warmup: false,
                is_completed: false,
                session_id: last.session_id,
                session_date: last.date,
                set_order: 99,
            });
        }
        self
    }

    pub fn into_log(self) -> RecordLog {
        RecordLog {
            sessions: self.sessions,
            sets: self.sets,
        }
    }

    pub fn build(self) -> InMemoryRecordStore {
        InMemoryRecordStore::from_log(self.into_log())
    }
}

/// Twelve weeks of Monday/Wednesday/Friday training with steady progression
pub fn twelve_week_program(now: DateTime<Utc>) -> LogBuilder {
    let mut builder = LogBuilder::new(now);

    // Oldest week first; `week` 0 is the most recent
    for week in (0..12).rev() {
        let step = (11 - week) as f64;
        let offset = week * 7;

        builder = builder
            .session(offset + 5, 60, &[(BENCH_PRESS, 60.0 + 2.5 * step, 8), (BARBELL_ROW, 70.0 + 2.5 * step, 8)])
            .session(offset + 3, 55, &[(SQUAT, 80.0 + 5.0 * step, 5), (OVERHEAD_PRESS, 40.0 + 1.25 * step, 8)])
            .session(offset + 1, 50, &[(DEADLIFT, 100.0 + 5.0 * step, 5), (BARBELL_ROW, 70.0 + 2.5 * step, 8)]);
    }

    builder.abandoned_set(BENCH_PRESS, 200.0, 1)
}

pub fn standard_store(now: DateTime<Utc>) -> Arc<InMemoryRecordStore> {
    Arc::new(twelve_week_program(now).build())
}

/// Serves sets normally but fails every session query
pub struct SessionOutageStore {
    pub inner: InMemoryRecordStore,
}

#[async_trait]
impl RecordStore for SessionOutageStore {
    async fn list_sets(&self, filter: &SetFilter) -> Result<Vec<SetRecord>> {
        self.inner.list_sets(filter).await
    }

    async fn list_sessions(&self, _filter: &SessionFilter) -> Result<Vec<SessionRecord>> {
        Err(anyhow!("session table unavailable"))
    }
}

/// Delays session queries past any reasonable analyzer timeout
pub struct SlowSessionStore {
    pub inner: InMemoryRecordStore,
    pub delay: std::time::Duration,
}

#[async_trait]
impl RecordStore for SlowSessionStore {
    async fn list_sets(&self, filter: &SetFilter) -> Result<Vec<SetRecord>> {
        self.inner.list_sets(filter).await
    }

    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<SessionRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_sessions(filter).await
    }
}
