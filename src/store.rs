use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::models::{HealthRecord, Outcome, Target, Transition};
use crate::usage;

struct StoreState {
    order: Vec<String>,
    records: HashMap<String, HealthRecord>,
}

/// Shared handle to the per-target health records.
///
/// Each record is replaced under the write lock as one unit, so readers never
/// see a half-applied update. Overlapping writers for the same target resolve
/// as last-write-wins.
#[derive(Clone)]
pub struct HealthStore {
    state: Arc<RwLock<StoreState>>,
}

impl HealthStore {
    pub fn new(targets: &[Target]) -> Self {
        let order = targets.iter().map(|t| t.id.clone()).collect();
        let records = targets
            .iter()
            .map(|t| (t.id.clone(), HealthRecord::new(t)))
            .collect();
        Self {
            state: Arc::new(RwLock::new(StoreState { order, records })),
        }
    }

    /// Applies a probe outcome to the target's record and reports a status
    /// change, if any.
    pub async fn apply(&self, target_id: &str, outcome: &Outcome, now: DateTime<Utc>) -> Option<Transition> {
        let resource_usage = match outcome {
            Outcome::Success { body, .. } => usage::extract(body),
            Outcome::Failure { .. } => String::new(),
        };

        let mut state = self.state.write().await;
        let Some(record) = state.records.get_mut(target_id) else {
            warn!(target_id, "Outcome for unregistered target dropped");
            return None;
        };

        let from = record.status;
        record.apply(outcome, resource_usage, now);
        let to = record.status;

        (from != to).then(|| Transition {
            from,
            to,
            uptime: record.uptime_label(),
            total_probes: record.total_probes(),
        })
    }

    pub async fn get(&self, target_id: &str) -> Option<HealthRecord> {
        self.state.read().await.records.get(target_id).cloned()
    }

    /// Records in registry order.
    pub async fn snapshot(&self) -> Vec<HealthRecord> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.records.get(id).cloned())
            .collect()
    }

    /// Records keyed by target id, as exposed over HTTP.
    pub async fn snapshot_map(&self) -> BTreeMap<String, HealthRecord> {
        let state = self.state.read().await;
        state
            .records
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }
}
