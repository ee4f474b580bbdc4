//! Configuration types for the healthcheck sidecar

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Environment variable holding the base URL of the default target
pub const ENV_API_URL: &str = "IL_GRANITE_API";
/// Environment variable holding the expected model of the default target
pub const ENV_MODEL_NAME: &str = "IL_GRANITE_MODEL_NAME";
/// Environment variable enabling Slack notifications
pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

/// Name given to the target created from environment variables
pub const DEFAULT_TARGET_NAME: &str = "granite";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
    #[serde(default)]
    pub server: ServerConfig,
}

/// One monitored inference endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub base_url: String,
    pub model_name: String,
    #[serde(default = "default_polling_interval")]
    pub polling_interval_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl TargetConfig {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            model_name: model_name.into(),
            polling_interval_seconds: default_polling_interval(),
            request_timeout_seconds: default_request_timeout(),
        }
    }

    pub fn health_api_url(&self) -> String {
        format!("{}/health", self.base_url.trim_end_matches('/'))
    }

    pub fn models_api_url(&self) -> String {
        format!("{}/v1/models", self.base_url.trim_end_matches('/'))
    }
}

/// Notifier configuration with tagged enum for extensibility
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifierConfig {
    #[serde(rename = "slack_webhook")]
    SlackWebhook {
        webhook_url: String,
        #[serde(default = "default_display_name")]
        display_name: String,
        #[serde(default)]
        mention: Option<String>,
    },
}

impl NotifierConfig {
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::SlackWebhook { .. } => "slack_webhook",
        }
    }
}

/// Status server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_server_port(),
        }
    }
}

fn default_polling_interval() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    5
}

fn default_display_name() -> String {
    "Granite".to_string()
}

fn default_true() -> bool {
    true
}

fn default_server_port() -> u16 {
    8080
}

impl Config {
    /// Apply the process environment on top of the loaded configuration
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// `IL_GRANITE_API` and `IL_GRANITE_MODEL_NAME` create or update the
    /// `granite` target. `SLACK_WEBHOOK_URL` adds a Slack notifier unless one
    /// is already configured.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(ENV_API_URL).filter(|v| !v.is_empty());
        let model_name = lookup(ENV_MODEL_NAME).filter(|v| !v.is_empty());

        if api_url.is_some() || model_name.is_some() {
            let index = match self
                .targets
                .iter()
                .position(|t| t.name == DEFAULT_TARGET_NAME)
            {
                Some(index) => index,
                None => {
                    self.targets
                        .push(TargetConfig::new(DEFAULT_TARGET_NAME, "", ""));
                    self.targets.len() - 1
                }
            };
            let target = &mut self.targets[index];
            if let Some(url) = api_url {
                tracing::debug!("{} overrides base URL of '{}'", ENV_API_URL, target.name);
                target.base_url = url;
            }
            if let Some(model) = model_name {
                tracing::debug!("{} overrides model of '{}'", ENV_MODEL_NAME, target.name);
                target.model_name = model;
            }
        }

        if let Some(webhook_url) = lookup(ENV_SLACK_WEBHOOK_URL).filter(|v| !v.is_empty()) {
            let has_slack = self
                .notifiers
                .iter()
                .any(|n| matches!(n, NotifierConfig::SlackWebhook { .. }));
            if !has_slack {
                tracing::info!(
                    "{} is set, running with Slack notifications",
                    ENV_SLACK_WEBHOOK_URL
                );
                self.notifiers.push(NotifierConfig::SlackWebhook {
                    webhook_url,
                    display_name: default_display_name(),
                    mention: None,
                });
            }
        }
    }

    /// Check that the configuration describes something runnable
    pub fn validate(&self) -> crate::Result<()> {
        if self.targets.is_empty() {
            return Err(crate::SidecarError::Config(format!(
                "No targets configured; set {} and {} or provide a config file",
                ENV_API_URL, ENV_MODEL_NAME
            )));
        }

        let mut names = HashSet::new();
        for target in &self.targets {
            if target.name.is_empty() {
                return Err(crate::SidecarError::Config(
                    "Target name must not be empty".to_string(),
                ));
            }
            if !names.insert(target.name.as_str()) {
                return Err(crate::SidecarError::Config(format!(
                    "Duplicate target name '{}'",
                    target.name
                )));
            }
            if target.model_name.is_empty() {
                return Err(crate::SidecarError::Config(format!(
                    "Target '{}' has no model name",
                    target.name
                )));
            }
            if !(target.base_url.starts_with("http://") || target.base_url.starts_with("https://"))
            {
                return Err(crate::SidecarError::Config(format!(
                    "Target '{}' base URL {:?} must start with http:// or https://",
                    target.name, target.base_url
                )));
            }
            if target.polling_interval_seconds == 0 {
                return Err(crate::SidecarError::Config(format!(
                    "Target '{}' polling interval must be positive",
                    target.name
                )));
            }
            if target.request_timeout_seconds == 0 {
                return Err(crate::SidecarError::Config(format!(
                    "Target '{}' request timeout must be positive",
                    target.name
                )));
            }
        }

        for notifier in &self.notifiers {
            match notifier {
                NotifierConfig::SlackWebhook { webhook_url, .. } if webhook_url.is_empty() => {
                    return Err(crate::SidecarError::Config(
                        "Slack webhook URL must not be empty".to_string(),
                    ));
                }
                NotifierConfig::SlackWebhook { .. } => {}
            }
        }

        Ok(())
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::SidecarError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
