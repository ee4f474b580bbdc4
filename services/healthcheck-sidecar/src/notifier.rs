//! Notifier trait and best-effort dispatch of incident events

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::incident::IncidentEvent;

/// Trait for delivering incident events
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "slack_webhook")
    fn type_name(&self) -> &str;

    /// Deliver one event
    async fn notify(&self, event: &IncidentEvent) -> crate::Result<()>;
}

/// Hand an event to every notifier on its own task.
///
/// Delivery failures are logged and dropped. The returned handles only
/// matter to callers that want to wait for delivery; the poll loop ignores
/// them.
pub fn dispatch(event: &IncidentEvent, notifiers: &[Arc<dyn Notifier>]) -> Vec<JoinHandle<()>> {
    if notifiers.is_empty() {
        tracing::debug!(
            "No notifiers configured, dropping {} event for '{}'",
            event.kind,
            event.target
        );
        return Vec::new();
    }

    notifiers
        .iter()
        .map(|notifier| {
            let notifier = Arc::clone(notifier);
            let event = event.clone();
            tokio::spawn(async move {
                tracing::debug!(
                    "Dispatching {} for '{}' to '{}'",
                    event.kind,
                    event.target,
                    notifier.type_name()
                );
                match notifier.notify(&event).await {
                    Ok(()) => tracing::info!(
                        "Sent {} notification for '{}' via '{}'",
                        event.kind,
                        event.target,
                        notifier.type_name()
                    ),
                    Err(e) => tracing::warn!(
                        "Notification via '{}' for '{}' failed: {}",
                        notifier.type_name(),
                        event.target,
                        e
                    ),
                }
            })
        })
        .collect()
}
