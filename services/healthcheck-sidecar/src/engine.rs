//! Engine: drives the probe -> observe -> store cycle for every target

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::incident::IncidentEvent;
use crate::notifier::{self, Notifier};
use crate::probe::Prober;
use crate::state::StateHandle;

/// The engine runs one polling loop per prober and dispatches notifications
pub struct Engine {
    probers: Vec<Arc<dyn Prober>>,
    notifiers: Vec<Arc<dyn Notifier>>,
    state: StateHandle,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        probers: Vec<Arc<dyn Prober>>,
        notifiers: Vec<Arc<dyn Notifier>>,
        state: StateHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            probers,
            notifiers,
            state,
            cancel,
        }
    }

    /// Start polling all targets. Returns when the cancellation token is triggered.
    pub async fn run(&self) {
        let mut handles = Vec::new();

        for prober in &self.probers {
            let prober = Arc::clone(prober);
            let state = Arc::clone(&self.state);
            let notifiers = self.notifiers.clone();
            let cancel = self.cancel.clone();

            handles.push(tokio::spawn(async move {
                poll_loop(prober, state, notifiers, cancel).await;
            }));
        }

        // Wait for cancellation
        self.cancel.cancelled().await;

        // Wait for all polling tasks to finish
        for handle in handles {
            let _ = handle.await;
        }
    }
}

async fn poll_loop(
    prober: Arc<dyn Prober>,
    state: StateHandle,
    notifiers: Vec<Arc<dyn Notifier>>,
    cancel: CancellationToken,
) {
    let interval = prober.polling_interval();

    loop {
        if cancel.is_cancelled() {
            break;
        }

        run_cycle(&prober, &state, &notifiers).await;

        // Next cycle starts only after this one has fully completed
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => {
                tracing::debug!("Polling loop for '{}' cancelled", prober.target());
                break;
            }
        }
    }
}

/// Run one polling cycle for a target.
///
/// The probe runs without holding the state lock; the transition check and
/// the store happen under a single write lock. Returns the event that was
/// dispatched, if the cycle caused a transition.
pub async fn run_cycle(
    prober: &Arc<dyn Prober>,
    state: &StateHandle,
    notifiers: &[Arc<dyn Notifier>],
) -> Option<IncidentEvent> {
    let target = prober.target().to_string();

    let previous = state.read().await.get(&target);
    let Some(previous) = previous else {
        tracing::warn!("Target '{}' is not in the status store", target);
        return None;
    };

    // A panicking prober surfaces as a JoinError instead of killing the loop
    let probe_task = {
        let prober = Arc::clone(prober);
        tokio::spawn(async move { prober.probe(&previous).await })
    };

    let record = match probe_task.await {
        Ok(Ok(record)) => record,
        Ok(Err(e)) => {
            let failures = state.write().await.mark_cycle_failed(&target);
            tracing::error!(
                "Error updating health status of '{}': {} ({} consecutive)",
                target,
                e,
                failures
            );
            return None;
        }
        Err(e) => {
            let failures = state.write().await.mark_cycle_failed(&target);
            tracing::error!(
                "Probe task for '{}' failed: {} ({} consecutive)",
                target,
                e,
                failures
            );
            return None;
        }
    };

    let report = record.to_report();
    let transition = state.write().await.apply(&target, record);

    tracing::info!("Updated health status of '{}': {:?}", target, report);

    let kind = transition?;
    tracing::info!("Target '{}' transition: {}", target, kind);

    let event = IncidentEvent {
        kind,
        target,
        status: report,
        timestamp: chrono::Utc::now(),
        health_api_url: prober.health_api_url().to_string(),
        models_api_url: prober.models_api_url().to_string(),
    };
    notifier::dispatch(&event, notifiers);
    Some(event)
}
