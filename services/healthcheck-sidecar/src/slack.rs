//! Slack incoming-webhook notifier

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::NotifierConfig;
use crate::incident::{IncidentEvent, IncidentKind};
use crate::io::HttpClient;
use crate::notifier::Notifier;

const OUTAGE_COLOR: &str = "#FF0000";
const RESOLUTION_COLOR: &str = "#36A64F";

/// Posts incident events to a Slack incoming webhook
pub struct SlackWebhookNotifier {
    webhook_url: String,
    display_name: String,
    mention: Option<String>,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for SlackWebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // webhook URLs embed a secret
        f.debug_struct("SlackWebhookNotifier")
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl SlackWebhookNotifier {
    pub fn new(config: &NotifierConfig, http: Arc<dyn HttpClient>) -> Self {
        let NotifierConfig::SlackWebhook {
            webhook_url,
            display_name,
            mention,
        } = config;

        tracing::debug!("Created SlackWebhookNotifier for '{}'", display_name);

        Self {
            webhook_url: webhook_url.clone(),
            display_name: display_name.clone(),
            mention: mention.clone(),
            http,
        }
    }

    /// Build the block-kit payload for an event
    pub fn build_payload(&self, event: &IncidentEvent) -> crate::Result<serde_json::Value> {
        let (header, status_text, color) = match event.kind {
            IncidentKind::Outage => (
                format!("{} Outage Incident", self.display_name),
                format!("{} endpoint went DOWN", self.display_name),
                OUTAGE_COLOR,
            ),
            IncidentKind::Resolution => (
                format!("{} Outage Resolved", self.display_name),
                format!("{} endpoint is BACK UP", self.display_name),
                RESOLUTION_COLOR,
            ),
        };

        let mut details = serde_json::to_value(&event.status)?;
        if let Some(map) = details.as_object_mut() {
            map.insert("target".to_string(), json!(event.target));
            map.insert("health_api_url".to_string(), json!(event.health_api_url));
            map.insert("models_api_url".to_string(), json!(event.models_api_url));
        }
        let details = serde_json::to_string_pretty(&details)?;
        let timestamp = event.timestamp.format("%Y-%m-%d %H:%M:%S UTC");

        let mut blocks = vec![json!({
            "type": "header",
            "text": { "type": "plain_text", "text": header }
        })];
        if let Some(mention) = &self.mention {
            blocks.push(json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": mention }
            }));
        }
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("{} at *{}*.", status_text, timestamp) }
        }));
        blocks.push(json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "*{} Status Details:*\n```json\n{}\n```",
                    self.display_name, details
                )
            }
        }));

        Ok(json!({
            "blocks": blocks,
            "attachments": [{ "color": color, "blocks": [] }]
        }))
    }
}

#[async_trait]
impl Notifier for SlackWebhookNotifier {
    fn type_name(&self) -> &str {
        "slack_webhook"
    }

    async fn notify(&self, event: &IncidentEvent) -> crate::Result<()> {
        let payload = self.build_payload(event)?;

        tracing::debug!(
            "Sending Slack {} notification for '{}'",
            event.kind,
            event.target
        );

        let response = self.http.post_json(&self.webhook_url, &payload).await?;

        if !response.is_success() {
            return Err(crate::SidecarError::Notifier(format!(
                "Slack webhook returned status {}: {}",
                response.status, response.body
            )));
        }

        tracing::debug!("Slack notification sent successfully");
        Ok(())
    }
}
