//! Incident tracking: debounced outage/resolution detection per target

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::status::{StatusRecord, StatusReport};

/// Kind of incident transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Outage,
    Resolution,
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentKind::Outage => write!(f, "outage"),
            IncidentKind::Resolution => write!(f, "resolution"),
        }
    }
}

/// Incident state machine for one target.
///
/// Two states, Stable and Incident. Transitions are only reported once the
/// first cycle has completed so the all-unknown bootstrap record never
/// produces an alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncidentState {
    in_incident: bool,
    initialized: bool,
}

impl IncidentState {
    pub fn in_incident(&self) -> bool {
        self.in_incident
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Feed the latest record and return the transition it caused, if any
    pub fn observe(&mut self, record: &StatusRecord) -> Option<IncidentKind> {
        let operational = record.is_operational();

        let transition = if !self.initialized {
            None
        } else if !operational && !self.in_incident {
            self.in_incident = true;
            Some(IncidentKind::Outage)
        } else if operational && self.in_incident {
            self.in_incident = false;
            Some(IncidentKind::Resolution)
        } else {
            None
        };

        self.initialized = true;
        transition
    }

    /// Record that a cycle finished without producing a record
    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }
}

/// A transition ready to be handed to notifiers
#[derive(Debug, Clone)]
pub struct IncidentEvent {
    pub kind: IncidentKind,
    pub target: String,
    pub status: StatusReport,
    pub timestamp: DateTime<Utc>,
    pub health_api_url: String,
    pub models_api_url: String,
}
