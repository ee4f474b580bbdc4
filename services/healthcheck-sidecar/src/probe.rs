//! Probers: one round of upstream checks per call

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::TargetConfig;
use crate::io::HttpClient;
use crate::status::{ApiStatus, StatusRecord};

/// Trait for checking the health of one target
#[async_trait]
pub trait Prober: Send + Sync + std::fmt::Debug {
    /// Name of the target this prober checks
    fn target(&self) -> &str;

    /// Expected model name, used to seed the initial record
    fn model_name(&self) -> &str;

    fn health_api_url(&self) -> &str;

    fn models_api_url(&self) -> &str;

    /// Time to wait between the end of one cycle and the start of the next
    fn polling_interval(&self) -> Duration;

    /// Run the checks and return `previous` updated with their outcome.
    ///
    /// An `Err` means the cycle produced no usable record at all.
    async fn probe(&self, previous: &StatusRecord) -> crate::Result<StatusRecord>;
}

/// `/v1/models` listing in the OpenAI-compatible shape
#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Prober for an OpenAI-compatible inference server
pub struct InferenceProber {
    target: String,
    model_name: String,
    health_api_url: String,
    models_api_url: String,
    polling_interval: Duration,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for InferenceProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceProber")
            .field("target", &self.target)
            .field("health_api_url", &self.health_api_url)
            .field("models_api_url", &self.models_api_url)
            .finish()
    }
}

impl InferenceProber {
    pub fn new(config: &TargetConfig, http: Arc<dyn HttpClient>) -> Self {
        let health_api_url = config.health_api_url();
        let models_api_url = config.models_api_url();

        tracing::debug!(
            "Created InferenceProber '{}' at {} / {}",
            config.name,
            health_api_url,
            models_api_url
        );

        Self {
            target: config.name.clone(),
            model_name: config.model_name.clone(),
            health_api_url,
            models_api_url,
            polling_interval: Duration::from_secs(config.polling_interval_seconds),
            http,
        }
    }

    async fn check_health_api(&self, record: &mut StatusRecord) {
        match self.http.get(&self.health_api_url).await {
            Ok(response) => {
                let status = if response.is_success() {
                    ApiStatus::Healthy
                } else {
                    tracing::debug!(
                        "Health API of '{}' returned status {}",
                        self.target,
                        response.status
                    );
                    ApiStatus::Unhealthy
                };
                record.set_health_api_status(status);
            }
            Err(e) => {
                tracing::debug!(
                    "Cannot connect to {} health API at {}: {}",
                    record.model_name(),
                    self.health_api_url,
                    e
                );
            }
        }
    }

    async fn check_models_api(&self, record: &mut StatusRecord) {
        let response = match self.http.get(&self.models_api_url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(
                    "Cannot connect to {} models API at {}: {}",
                    record.model_name(),
                    self.models_api_url,
                    e
                );
                return;
            }
        };

        if !response.is_success() {
            tracing::debug!(
                "Models API of '{}' returned status {}",
                self.target,
                response.status
            );
            record.set_model_status(ApiStatus::Unhealthy);
            record.set_available_models(Vec::new());
            return;
        }

        match serde_json::from_str::<ModelList>(&response.body) {
            Ok(list) => {
                record.set_model_status(ApiStatus::Healthy);
                record.set_available_models(list.data.into_iter().map(|m| m.id).collect());
            }
            Err(e) => {
                tracing::warn!(
                    "Malformed models listing from '{}' at {}: {}",
                    self.target,
                    self.models_api_url,
                    e
                );
                record.set_model_status(ApiStatus::Unhealthy);
                record.set_available_models(Vec::new());
            }
        }
    }
}

#[async_trait]
impl Prober for InferenceProber {
    fn target(&self) -> &str {
        &self.target
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn health_api_url(&self) -> &str {
        &self.health_api_url
    }

    fn models_api_url(&self) -> &str {
        &self.models_api_url
    }

    fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    async fn probe(&self, previous: &StatusRecord) -> crate::Result<StatusRecord> {
        let mut record = previous.clone();
        self.check_health_api(&mut record).await;
        self.check_models_api(&mut record).await;
        Ok(record)
    }
}
