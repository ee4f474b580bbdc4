//! BDD step definitions for the sidecar lifecycle feature

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use healthcheck_sidecar::config::{NotifierConfig, TargetConfig};
use healthcheck_sidecar::io::HttpClient;
use healthcheck_sidecar::probe::Prober;
use healthcheck_sidecar::status::{ApiStatus, StatusRecord};
use healthcheck_sidecar::{load_config, Config, SidecarBuilder};

use crate::steps::probe_steps::{http, parse_status};
use crate::world::SidecarWorld;

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Prober that reports a fixed healthy record without touching the network
#[derive(Debug)]
struct FixedProber {
    target: String,
}

#[async_trait]
impl Prober for FixedProber {
    fn target(&self) -> &str {
        &self.target
    }

    fn model_name(&self) -> &str {
        "fixed-model"
    }

    fn health_api_url(&self) -> &str {
        "http://fixed.local/health"
    }

    fn models_api_url(&self) -> &str {
        "http://fixed.local/v1/models"
    }

    fn polling_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn probe(&self, _previous: &StatusRecord) -> healthcheck_sidecar::Result<StatusRecord> {
        let mut record = StatusRecord::new("fixed-model");
        record.set_health_api_status(ApiStatus::Healthy);
        record.set_model_status(ApiStatus::Healthy);
        record.set_available_models(vec!["fixed-model".to_string()]);
        Ok(record)
    }
}

fn config_mut(world: &mut SidecarWorld) -> &mut Config {
    world.sidecar_config.get_or_insert_with(Config::default)
}

fn builder(world: &mut SidecarWorld) -> SidecarBuilder {
    let config = world.sidecar_config.clone().unwrap_or_default();
    let mut builder = SidecarBuilder::new(config);
    if let Some(client) = world.http.clone() {
        builder = builder.with_http_client(client as Arc<dyn HttpClient>);
    }
    if let Some(probers) = world.injected_probers.clone() {
        builder = builder.with_probers(probers);
    }
    if let Some(cancel) = world.lifecycle_cancel.clone() {
        builder = builder.with_cancellation_token(cancel);
    }
    builder
}

async fn fetch_status(addr: SocketAddr) -> Option<serde_json::Value> {
    let url = format!("http://127.0.0.1:{}/health", addr.port());
    let response = reqwest::get(&url).await.ok()?;
    response.json().await.ok()
}

#[given("an empty sidecar config")]
fn empty_config(world: &mut SidecarWorld) {
    let mut config = Config::default();
    config.server.enabled = false;
    world.sidecar_config = Some(config);
}

#[given(expr = "a sidecar config with target {string} expecting model {string}")]
fn config_with_target(world: &mut SidecarWorld, name: String, model: String) {
    let mut target = TargetConfig::new(name, "http://inference.local:8000", model);
    target.polling_interval_seconds = 1;
    let config = config_mut(world);
    config.targets.push(target);
    config.server.port = 0;
}

#[given(expr = "a sidecar config file with target {string} expecting model {string}")]
fn config_file_with_target(world: &mut SidecarWorld, name: String, model: String) {
    let json = serde_json::json!({
        "targets": [{
            "name": name,
            "base_url": "http://inference.local:8000",
            "model_name": model,
            "polling_interval_seconds": 1
        }],
        "server": {"port": 0}
    });
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{}", json).expect("write config");
    let config = load_config(file.path()).expect("load config");
    config.validate().expect("config should validate");
    world.sidecar_config = Some(config);
}

#[given("the status server is disabled")]
fn server_disabled(world: &mut SidecarWorld) {
    config_mut(world).server.enabled = false;
}

#[given(expr = "the sidecar config has a Slack webhook {string}")]
fn config_with_slack(world: &mut SidecarWorld, webhook_url: String) {
    config_mut(world).notifiers.push(NotifierConfig::SlackWebhook {
        webhook_url,
        display_name: "Granite".to_string(),
        mention: None,
    });
}

#[given(expr = "an injected prober for target {string}")]
fn injected_prober(world: &mut SidecarWorld, target: String) {
    let prober: Arc<dyn Prober> = Arc::new(FixedProber { target });
    world
        .injected_probers
        .get_or_insert_with(Vec::new)
        .push(prober);
}

#[given("a pre-cancelled cancellation token")]
fn pre_cancelled_token(world: &mut SidecarWorld) {
    let token = CancellationToken::new();
    token.cancel();
    world.lifecycle_cancel = Some(token);
}

#[when("the sidecar is built")]
async fn sidecar_built(world: &mut SidecarWorld) {
    match builder(world).build().await {
        Ok(sidecar) => {
            world.state = Some(sidecar.state());
            world.sidecar_addr = sidecar.local_addr();
            world.build_succeeded = Some(true);
        }
        Err(_) => world.build_succeeded = Some(false),
    }
}

#[when("the sidecar is built and started")]
async fn sidecar_built_and_started(world: &mut SidecarWorld) {
    let sidecar = builder(world).build().await.expect("build failed");
    world.build_succeeded = Some(true);
    world.state = Some(sidecar.state());

    let result = tokio::time::timeout(WAIT_TIMEOUT, sidecar.start())
        .await
        .expect("sidecar did not stop");
    world.start_succeeded = Some(result.is_ok());
}

#[when("the sidecar is started in the background")]
async fn sidecar_started_in_background(world: &mut SidecarWorld) {
    world
        .lifecycle_cancel
        .get_or_insert_with(CancellationToken::new);
    let sidecar = builder(world)
        .build()
        .await
        .expect("build failed");
    world.build_succeeded = Some(true);
    world.state = Some(sidecar.state());
    world.sidecar_addr = sidecar.local_addr();
    world.running = Some(tokio::spawn(sidecar.start()));
}

#[when(expr = "the health API starts answering {int}")]
async fn health_starts_answering(world: &mut SidecarWorld, status: u16) {
    let body = if status < 300 {
        r#"{"status": "healthy"}"#.to_string()
    } else {
        String::new()
    };
    *http(world).health.write().await = crate::world::Reply::Respond(status, body);
}

#[when("the sidecar is stopped")]
async fn sidecar_stopped(world: &mut SidecarWorld) {
    world
        .lifecycle_cancel
        .as_ref()
        .expect("no cancellation token")
        .cancel();
    let running = world.running.take().expect("sidecar not running");
    let result = tokio::time::timeout(WAIT_TIMEOUT, running)
        .await
        .expect("sidecar did not stop")
        .expect("sidecar task panicked");
    world.start_succeeded = Some(result.is_ok());
}

#[then("the build should succeed")]
fn build_succeeds(world: &mut SidecarWorld) {
    assert_eq!(world.build_succeeded, Some(true));
}

#[then("the build should fail")]
fn build_fails(world: &mut SidecarWorld) {
    assert_eq!(world.build_succeeded, Some(false));
}

#[then("the lifecycle should complete successfully")]
fn lifecycle_completes(world: &mut SidecarWorld) {
    assert_eq!(world.start_succeeded, Some(true));
}

#[then("the sidecar should expose a status server")]
fn exposes_status_server(world: &mut SidecarWorld) {
    assert!(world.sidecar_addr.is_some());
}

#[then("the sidecar should not expose a status server")]
fn no_status_server(world: &mut SidecarWorld) {
    assert!(world.sidecar_addr.is_none());
}

#[then(expr = "the status store should track target {string}")]
async fn store_tracks_target(world: &mut SidecarWorld, name: String) {
    let state = world.state.as_ref().expect("sidecar not built");
    assert!(state.read().await.get(&name).is_some());
}

#[then(
    expr = "the status endpoint should eventually report {string} with health API status {string}"
)]
async fn endpoint_eventually_reports(world: &mut SidecarWorld, name: String, expected: String) {
    let addr = world.sidecar_addr.expect("status server not bound");
    let expected = parse_status(&expected);

    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    loop {
        if let Some(json) = fetch_status(addr).await {
            let actual: Option<ApiStatus> =
                serde_json::from_value(json[&name]["health_api_status"].clone()).ok();
            if actual == Some(expected) {
                return;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "status endpoint never reported {} as {}",
            name,
            expected
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[then(expr = "the webhook {string} should eventually receive an outage message")]
async fn webhook_receives_outage(world: &mut SidecarWorld, webhook_url: String) {
    let client = http(world);
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    loop {
        {
            let posts = client.posts.read().await;
            if let Some((_, payload)) = posts.iter().find(|(url, _)| *url == webhook_url) {
                let text = payload.to_string();
                assert!(text.contains("Outage Incident"), "payload: {}", text);
                return;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "webhook {} never received a message",
            webhook_url
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
