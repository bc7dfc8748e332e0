//! ScalingStateStore — per-workload state that outlives a single cycle.
//!
//! The store is owned by the scheduler and only touched between cycles.
//! A cycle works on a staged copy of the entries it needs and commits them
//! back in one step when it succeeds; entries for workloads that left the
//! listing are evicted at the same time.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::types::{AppId, ScalingState};

/// In-memory map of app id → scaling state.
#[derive(Debug, Clone, Default)]
pub struct ScalingStateStore {
    states: HashMap<AppId, ScalingState>,
}

impl ScalingStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, app_id: &str) -> Option<&ScalingState> {
        self.states.get(app_id)
    }

    /// Copy of the state for `app_id`, or a fresh state on first observation.
    pub fn staged(&self, app_id: &str) -> ScalingState {
        self.states.get(app_id).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn contains(&self, app_id: &str) -> bool {
        self.states.contains_key(app_id)
    }

    /// Write back the staged states of a successful cycle and drop every
    /// entry whose id is not in `listed`. Returns the number evicted.
    pub fn commit(
        &mut self,
        staged: HashMap<AppId, ScalingState>,
        listed: &HashSet<AppId>,
    ) -> usize {
        self.states.extend(staged);

        let before = self.states.len();
        self.states.retain(|id, _| listed.contains(id));
        let evicted = before - self.states.len();

        if evicted > 0 {
            debug!(evicted, remaining = self.states.len(), "evicted scaling state");
        }
        evicted
    }
}
