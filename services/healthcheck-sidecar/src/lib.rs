//! Healthcheck sidecar - inference endpoint monitoring service
//!
//! Polls the liveness and model-listing APIs of inference servers, raises
//! debounced outage/resolution notifications, and serves the latest status
//! as JSON for orchestration probes.

pub mod config;
pub mod engine;
pub mod error;
pub mod incident;
pub mod io;
pub mod notifier;
pub mod probe;
pub mod server;
pub mod slack;
pub mod state;
pub mod status;
pub mod stub;

pub use config::{load_config, Config};
pub use error::{Result, SidecarError};

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::NotifierConfig;
use crate::engine::Engine;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::Notifier;
use crate::probe::{InferenceProber, Prober};
use crate::slack::SlackWebhookNotifier;
use crate::state::StateHandle;

/// Timeout for outbound notification requests
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Assembles a [`Sidecar`] from configuration, with optional injected parts
pub struct SidecarBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    probers: Option<Vec<Arc<dyn Prober>>>,
    notifiers: Option<Vec<Arc<dyn Notifier>>>,
    cancel: Option<CancellationToken>,
}

impl SidecarBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            probers: None,
            notifiers: None,
            cancel: None,
        }
    }

    /// Use this client for every probe and notification instead of reqwest
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Replace the probers built from `config.targets`
    pub fn with_probers(mut self, probers: Vec<Arc<dyn Prober>>) -> Self {
        self.probers = Some(probers);
        self
    }

    /// Replace the notifiers built from `config.notifiers`
    pub fn with_notifiers(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers = Some(notifiers);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn build(self) -> Result<Sidecar> {
        let probers = match self.probers {
            Some(probers) => probers,
            None => {
                let mut probers: Vec<Arc<dyn Prober>> = Vec::new();
                for target in &self.config.targets {
                    let http: Arc<dyn HttpClient> = match &self.http {
                        Some(http) => Arc::clone(http),
                        None => Arc::new(ReqwestHttpClient::new(Duration::from_secs(
                            target.request_timeout_seconds,
                        ))?),
                    };
                    probers.push(Arc::new(InferenceProber::new(target, http)));
                }
                probers
            }
        };

        if probers.is_empty() {
            return Err(SidecarError::Config("No targets configured".to_string()));
        }
        let mut names = HashSet::new();
        for prober in &probers {
            if !names.insert(prober.target().to_string()) {
                return Err(SidecarError::Config(format!(
                    "Duplicate target name '{}'",
                    prober.target()
                )));
            }
        }

        let notifiers = match self.notifiers {
            Some(notifiers) => notifiers,
            None => {
                let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
                for notifier_config in &self.config.notifiers {
                    let http: Arc<dyn HttpClient> = match &self.http {
                        Some(http) => Arc::clone(http),
                        None => Arc::new(ReqwestHttpClient::new(NOTIFY_TIMEOUT)?),
                    };
                    let notifier: Arc<dyn Notifier> = match notifier_config {
                        NotifierConfig::SlackWebhook { .. } => {
                            Arc::new(SlackWebhookNotifier::new(notifier_config, http))
                        }
                    };
                    notifiers.push(notifier);
                }
                notifiers
            }
        };

        let state = state::new_state_handle(
            probers
                .iter()
                .map(|p| (p.target().to_string(), p.model_name().to_string()))
                .collect(),
        );

        let listener = if self.config.server.enabled {
            Some(server::bind(self.config.server.port).await?)
        } else {
            None
        };

        let cancel = self.cancel.unwrap_or_default();

        tracing::debug!(
            "Built sidecar with {} targets and {} notifiers",
            probers.len(),
            notifiers.len()
        );

        let engine = Engine::new(probers, notifiers, Arc::clone(&state), cancel.clone());

        Ok(Sidecar {
            engine,
            state,
            listener,
            cancel,
        })
    }
}

/// A fully wired sidecar, ready to start
pub struct Sidecar {
    engine: Engine,
    state: StateHandle,
    listener: Option<TcpListener>,
    cancel: CancellationToken,
}

impl Sidecar {
    pub fn state(&self) -> StateHandle {
        Arc::clone(&self.state)
    }

    /// Address of the status server, if enabled
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the status server and polling loops until cancelled
    pub async fn start(self) -> Result<()> {
        let cancel_for_signal = self.cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                    cancel_for_signal.cancel();
                }
                Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
            }
        });

        let server = self.listener.map(|listener| {
            let state = Arc::clone(&self.state);
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                if let Err(e) = server::serve(listener, state, cancel.clone()).await {
                    tracing::error!("{}", e);
                    cancel.cancel();
                }
            })
        });

        tracing::info!("Healthcheck sidecar started");

        // Blocks until cancelled
        self.engine.run().await;

        if let Some(server) = server {
            let _ = server.await;
        }

        tracing::info!("Healthcheck sidecar stopped");
        Ok(())
    }
}
