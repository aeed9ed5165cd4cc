// Record store seam: the engine only reads sets and sessions through this trait

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::{SessionFilter, SessionRecord, SetFilter, SetRecord};

/// Read-only source of logged workout records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Sets matching the filter, ordered by session date then set order
    async fn list_sets(&self, filter: &SetFilter) -> Result<Vec<SetRecord>>;

    /// Sessions matching the filter, ordered by date
    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<SessionRecord>>;
}

/// Serialized form of a workout log snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordLog {
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

/// Point-in-time snapshot of a workout log held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    sessions: Vec<SessionRecord>,
    sets: Vec<SetRecord>,
}

impl InMemoryRecordStore {
    pub fn new(mut sessions: Vec<SessionRecord>, mut sets: Vec<SetRecord>) -> Self {
        sessions.sort_by(|a, b| a.date.cmp(&b.date));
        sets.sort_by(|a, b| {
            a.session_date
                .cmp(&b.session_date)
                .then(a.set_order.cmp(&b.set_order))
        });

        Self { sessions, sets }
    }

    pub fn from_log(log: RecordLog) -> Self {
        Self::new(log.sessions, log.sets)
    }

    /// Load a JSON record log from disk
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!("Loading workout log from {:?}", path);

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read workout log {:?}", path))?;
        let log: RecordLog =
            serde_json::from_str(&contents).context("Failed to parse workout log")?;

        tracing::info!(
            "Loaded {} sessions and {} sets",
            log.sessions.len(),
            log.sets.len()
        );

        Ok(Self::from_log(log))
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() && self.sets.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_sets(&self, filter: &SetFilter) -> Result<Vec<SetRecord>> {
        Ok(self
            .sets
            .iter()
            .filter(|set| filter.matches(set))
            .cloned()
            .collect())
    }

    async fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<SessionRecord>> {
        Ok(self
            .sessions
            .iter()
            .filter(|session| filter.matches(session))
            .cloned()
            .collect())
    }
}
