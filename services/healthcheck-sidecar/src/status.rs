//! Status record for a monitored inference target

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one upstream API check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiStatus::Unknown => write!(f, "unknown"),
            ApiStatus::Healthy => write!(f, "healthy"),
            ApiStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Latest known health of one target.
///
/// Availability of the expected model is derived from `available_models`
/// every time the list is replaced, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    health_api_status: ApiStatus,
    model_status: ApiStatus,
    model_name: String,
    available_models: Vec<String>,
    target_model_available: bool,
}

impl StatusRecord {
    /// A record with everything unknown, as used before the first poll
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            health_api_status: ApiStatus::Unknown,
            model_status: ApiStatus::Unknown,
            model_name: model_name.into(),
            available_models: Vec::new(),
            target_model_available: false,
        }
    }

    pub fn health_api_status(&self) -> ApiStatus {
        self.health_api_status
    }

    pub fn model_status(&self) -> ApiStatus {
        self.model_status
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn available_models(&self) -> &[String] {
        &self.available_models
    }

    pub fn is_target_model_available(&self) -> bool {
        self.target_model_available
    }

    pub fn set_health_api_status(&mut self, status: ApiStatus) {
        self.health_api_status = status;
    }

    pub fn set_model_status(&mut self, status: ApiStatus) {
        self.model_status = status;
    }

    /// Replace the served model list and recompute availability
    pub fn set_available_models(&mut self, models: Vec<String>) {
        self.target_model_available = models.iter().any(|m| *m == self.model_name);
        self.available_models = models;
    }

    /// True when the liveness check passed and the expected model is served
    pub fn is_operational(&self) -> bool {
        self.health_api_status == ApiStatus::Healthy && self.target_model_available
    }

    /// Wire representation used by the status endpoint and notifications
    pub fn to_report(&self) -> StatusReport {
        StatusReport {
            health_api_status: self.health_api_status,
            models_api_status: ModelsApiReport {
                status: self.model_status,
                model_name: self.model_name.clone(),
                models: self.available_models.clone(),
                available: self.target_model_available,
            },
        }
    }
}

/// Serialized form of a [`StatusRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub health_api_status: ApiStatus,
    pub models_api_status: ModelsApiReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsApiReport {
    pub status: ApiStatus,
    pub model_name: String,
    pub models: Vec<String>,
    pub available: bool,
}
