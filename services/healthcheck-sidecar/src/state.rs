//! Shared status store for all monitored targets

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::incident::{IncidentKind, IncidentState};
use crate::status::{StatusRecord, StatusReport};

/// Everything known about one target
#[derive(Debug, Clone)]
pub struct TargetStatus {
    pub name: String,
    pub record: StatusRecord,
    pub incident: IncidentState,
    pub consecutive_failures: u32,
}

/// Shared state accessible by the poll loops and the status server.
///
/// Records and incident state live side by side so one lock covers the
/// whole observe-then-store step.
#[derive(Debug)]
pub struct SharedState {
    pub targets: Vec<TargetStatus>,
}

impl SharedState {
    /// Create the store from `(target name, expected model)` pairs
    pub fn new(targets: Vec<(String, String)>) -> Self {
        let targets = targets
            .into_iter()
            .map(|(name, model_name)| TargetStatus {
                name,
                record: StatusRecord::new(model_name),
                incident: IncidentState::default(),
                consecutive_failures: 0,
            })
            .collect();

        Self { targets }
    }

    fn target_mut(&mut self, name: &str) -> Option<&mut TargetStatus> {
        self.targets.iter_mut().find(|t| t.name == name)
    }

    /// Snapshot of a target's current record
    pub fn get(&self, name: &str) -> Option<StatusRecord> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.record.clone())
    }

    /// Replace a target's record without evaluating transitions.
    /// Returns false for an unknown target.
    pub fn set(&mut self, name: &str, record: StatusRecord) -> bool {
        match self.target_mut(name) {
            Some(target) => {
                target.record = record;
                true
            }
            None => false,
        }
    }

    /// Evaluate the incident transition for `record` and store it
    pub fn apply(&mut self, name: &str, record: StatusRecord) -> Option<IncidentKind> {
        let target = self.target_mut(name)?;
        let transition = target.incident.observe(&record);
        target.record = record;
        target.consecutive_failures = 0;
        transition
    }

    /// Count a cycle that produced no record; it still ends bootstrap
    pub fn mark_cycle_failed(&mut self, name: &str) -> u32 {
        match self.target_mut(name) {
            Some(target) => {
                target.incident.mark_initialized();
                target.consecutive_failures += 1;
                target.consecutive_failures
            }
            None => 0,
        }
    }

    pub fn incident(&self, name: &str) -> Option<IncidentState> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.incident)
    }

    /// Serialized view of every target, keyed by name
    pub fn reports(&self) -> BTreeMap<String, StatusReport> {
        self.targets
            .iter()
            .map(|t| (t.name.clone(), t.record.to_report()))
            .collect()
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(targets: Vec<(String, String)>) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(targets)))
}
