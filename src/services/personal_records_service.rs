use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RecencyThresholds;
use crate::errors::{AnalyticsError, AnalyticsResult};
use crate::models::{AnalysisWindow, PersonalRecord, Recency, SetFilter, SetRecord};
use crate::services::statistics::{estimated_one_rep_max, round_to};
use crate::storage::RecordStore;

#[derive(Clone)]
pub struct PersonalRecordsService {
    store: Arc<dyn RecordStore>,
    thresholds: RecencyThresholds,
}

struct ExerciseBests<'a> {
    first: &'a SetRecord,
    max_weight: f64,
    max_reps: u32,
    max_volume: f64,
    max_one_rep_max: f64,
    sessions: HashSet<Uuid>,
    weight_sum: f64,
    reps_sum: u64,
    set_count: u32,
    first_performed: DateTime<Utc>,
    last_performed: DateTime<Utc>,
}

impl PersonalRecordsService {
    pub fn new(store: Arc<dyn RecordStore>, thresholds: RecencyThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Per-exercise bests, strongest estimated 1RM first, optionally capped to `limit`
    pub async fn analyze(
        &self,
        window: &AnalysisWindow,
        limit: Option<usize>,
    ) -> AnalyticsResult<Vec<PersonalRecord>> {
        info!("Collecting personal records (limit: {:?})", limit);

        let sets = match self.store.list_sets(&SetFilter::working_sets(window)).await {
            Ok(sets) => sets,
            Err(e) => {
                warn!("{}", AnalyticsError::data_unavailable("Personal records", &e));
                return Ok(Vec::new());
            }
        };

        Ok(self.build_records(&sets, window.now, limit))
    }

    pub fn build_records(
        &self,
        sets: &[SetRecord],
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Vec<PersonalRecord> {
        let mut bests: BTreeMap<Uuid, ExerciseBests> = BTreeMap::new();

        for set in sets.iter().filter(|s| s.is_working_set()) {
            let entry = bests.entry(set.exercise_id).or_insert_with(|| ExerciseBests {
                first: set,
                max_weight: 0.0,
                max_reps: 0,
                max_volume: 0.0,
                max_one_rep_max: 0.0,
                sessions: HashSet::new(),
                weight_sum: 0.0,
                reps_sum: 0,
                set_count: 0,
                first_performed: set.session_date,
                last_performed: set.session_date,
            });

            entry.max_weight = entry.max_weight.max(set.weight);
            entry.max_reps = entry.max_reps.max(set.reps);
            entry.max_volume = entry.max_volume.max(set.volume());
            entry.max_one_rep_max = entry.max_one_rep_max.max(estimated_one_rep_max(set.weight, set.reps));
            entry.sessions.insert(set.session_id);
            entry.weight_sum += set.weight;
            entry.reps_sum += set.reps as u64;
            entry.set_count += 1;
            entry.first_performed = entry.first_performed.min(set.session_date);
            entry.last_performed = entry.last_performed.max(set.session_date);
        }

        let mut records: Vec<PersonalRecord> = bests
            .into_iter()
            .map(|(exercise_id, bests)| {
                let count = bests.set_count.max(1) as f64;
                PersonalRecord {
                    exercise_id,
                    exercise_name: bests.first.exercise_name.clone(),
                    muscle_group_category: bests.first.muscle_group_category.clone(),
                    max_weight: bests.max_weight,
                    max_reps: bests.max_reps,
                    max_volume: bests.max_volume,
                    estimated_one_rep_max: bests.max_one_rep_max,
                    session_count: bests.sessions.len() as u32,
                    avg_weight: round_to(bests.weight_sum / count, 1),
                    avg_reps: round_to(bests.reps_sum as f64 / count, 1),
                    first_performed: bests.first_performed,
                    last_performed: bests.last_performed,
                    recency: self.recency(bests.last_performed, now),
                }
            })
            .collect();

        // Stable sort keeps exercise id order among equal maxes
        records.sort_by(|a, b| b.estimated_one_rep_max.total_cmp(&a.estimated_one_rep_max));

        if let Some(limit) = limit {
            records.truncate(limit);
        }

        debug!("Built {} personal records", records.len());
        records
    }

    pub fn recency(&self, last_performed: DateTime<Utc>, now: DateTime<Utc>) -> Recency {
        let days = (now - last_performed).num_days();
        if days <= self.thresholds.recent_days {
            Recency::Recent
        } else if days <= self.thresholds.moderate_days {
            Recency::Moderate
        } else {
            Recency::Old
        }
    }
}
