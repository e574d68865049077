// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use spool_agents::{GroupState, PreloadAgent};
use spool_core::{
    AssetDescriptor, AssetId, AssetRegistry, DecodeError, FetchError, FetchedAsset, HandleFactory,
    PreloadConfig, PreloadEvent, Priority, Transport,
};
use spool_data::AssetStatus;
use spool_telemetry::MetricsRegistry;
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

// --- Test setup: a recording transport and a string-handle factory ---

#[derive(Default)]
struct RecordingTransport {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn fetch_bytes(&self, locator: &str) -> Result<FetchedAsset, FetchError> {
        self.calls.lock().unwrap().push(locator.to_owned());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(locator) {
            return Err(FetchError::Transport {
                locator: locator.to_owned(),
                message: "connection reset".into(),
            });
        }
        Ok(FetchedAsset::new(vec![1, 2, 3], Some("image/png".into())))
    }
}

#[derive(Default)]
struct StringFactory {
    created: AtomicUsize,
    released: Mutex<Vec<String>>,
}

impl HandleFactory for StringFactory {
    type Handle = String;

    fn create_handle(&self, id: &AssetId, _asset: FetchedAsset) -> Result<String, DecodeError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("handle:{id}"))
    }

    fn release_handle(&self, handle: String) {
        self.released.lock().unwrap().push(handle);
    }
}

type Agent = PreloadAgent<Arc<RecordingTransport>, StringFactory>;

fn asset(id: &str, priority: Priority) -> AssetDescriptor {
    AssetDescriptor::new(id, format!("/img/{id}.png"), priority)
}

fn registry() -> Arc<AssetRegistry> {
    Arc::new(
        AssetRegistry::builder()
            .group(
                "essential",
                [asset("logo", Priority::High), asset("font", Priority::Medium)],
            )
            .group("interactions", [asset("button", Priority::Medium)])
            .group(
                "animations",
                [
                    asset("f0", Priority::High),
                    asset("f1", Priority::Low),
                    asset("f2", Priority::High),
                ],
            )
            .build()
            .unwrap(),
    )
}

fn agent_with(
    transport: Arc<RecordingTransport>,
    config: PreloadConfig,
) -> (Arc<StringFactory>, Agent) {
    let factory = Arc::new(StringFactory::default());
    let agent = PreloadAgent::from_parts(transport, factory.clone(), registry(), config).unwrap();
    (factory, agent)
}

fn agent(transport: Arc<RecordingTransport>) -> (Arc<StringFactory>, Agent) {
    agent_with(transport, PreloadConfig::default())
}
// ---

#[tokio::test]
async fn repeated_group_request_loads_once() {
    let transport = Arc::new(RecordingTransport::default());
    let (_, agent) = agent(transport.clone());

    let first = agent.preload_group("essential").await;
    let second = agent.preload_group("essential").await;

    assert_eq!(first.map(|report| report.loaded), Some(2));
    assert_eq!(second, None);
    assert_eq!(transport.calls().len(), 2);
    assert_eq!(agent.group_state("essential"), GroupState::Loaded);
}

#[tokio::test(start_paused = true)]
async fn concurrent_group_requests_share_one_load() {
    let transport = Arc::new(RecordingTransport::slow(Duration::from_millis(20)));
    let (_, agent) = agent(transport.clone());

    let (first, second) = tokio::join!(
        agent.preload_group("animations"),
        agent.preload_group("animations")
    );

    assert!(first.is_some());
    assert_eq!(second, None);
    assert_eq!(transport.calls().len(), 3);
    assert!(agent.get_image("f1").is_some());
}

#[tokio::test]
async fn unknown_group_is_ignored() {
    let transport = Arc::new(RecordingTransport::default());
    let (_, agent) = agent(transport.clone());

    assert_eq!(agent.preload_group("credits").await, None);
    assert_eq!(agent.group_state("credits"), GroupState::NotRequested);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn animation_group_loads_in_priority_order() {
    let transport = Arc::new(RecordingTransport::default());
    let (_, agent) = agent(transport.clone());

    agent.preload_group("animations").await;

    assert_eq!(
        transport.calls(),
        vec!["/img/f0.png", "/img/f2.png", "/img/f1.png"]
    );
    for id in ["f0", "f1", "f2"] {
        assert_eq!(agent.get_image(id), Some(format!("handle:{id}")));
    }
    assert!(agent.loaded_groups().contains(&"animations".to_string()));
    assert_eq!(agent.loading_progress(), 100.0);
    assert!(!agent.is_loading());
}

#[tokio::test]
async fn progress_is_zero_before_any_load() {
    let (_, agent) = agent(Arc::new(RecordingTransport::default()));
    assert_eq!(agent.loading_progress(), 0.0);
    assert!(!agent.is_initialized());
}

#[tokio::test]
async fn failed_assets_are_distinguishable_and_retryable() {
    let transport = Arc::new(RecordingTransport::default());
    transport
        .failing
        .lock()
        .unwrap()
        .insert("/img/f1.png".to_string());
    let (_, agent) = agent(transport.clone());

    let report = agent.preload_group("animations").await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(agent.group_state("animations"), GroupState::Loaded);
    assert_eq!(agent.get_image("f1"), None);
    assert!(matches!(agent.image_status("f1"), AssetStatus::Failed(_)));
    assert!(matches!(agent.image_status("nope"), AssetStatus::Absent));

    // A plain repeat is a no-op; an explicit retry fetches only the failed asset.
    assert_eq!(agent.preload_group("animations").await, None);
    transport.failing.lock().unwrap().clear();
    let retried = agent.retry_group("animations").await.unwrap();

    assert_eq!(retried.loaded, 1);
    assert_eq!(retried.cache_hits, 2);
    assert_eq!(agent.get_image("f1").as_deref(), Some("handle:f1"));
    assert_eq!(transport.calls().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn start_loads_essential_then_background() {
    let transport = Arc::new(RecordingTransport::default());
    let (_, agent) = agent(transport.clone());

    agent.start();
    agent.wait_initialized().await;

    assert!(agent.is_initialized());
    assert_eq!(agent.group_state("essential"), GroupState::Loaded);
    assert_eq!(agent.group_state("interactions"), GroupState::NotRequested);

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    assert_eq!(agent.group_state("interactions"), GroupState::Loaded);
    assert!(agent.get_image("button").is_some());
    assert_eq!(agent.group_state("animations"), GroupState::NotRequested);
}

#[tokio::test(start_paused = true)]
async fn initialization_does_not_depend_on_asset_outcomes() {
    let transport = Arc::new(RecordingTransport::default());
    transport
        .failing
        .lock()
        .unwrap()
        .insert("/img/logo.png".to_string());
    let config = PreloadConfig {
        background_group: None,
        ..PreloadConfig::default()
    };
    let (_, agent) = agent_with(transport, config);

    agent.start();
    agent.wait_initialized().await;

    assert!(agent.is_initialized());
    assert_eq!(agent.get_image("logo"), None);
    assert_eq!(agent.get_image("font").as_deref(), Some("handle:font"));
}

#[tokio::test(start_paused = true)]
async fn missing_essential_group_still_initializes() {
    let config = PreloadConfig {
        essential_group: "boot".into(),
        background_group: None,
        ..PreloadConfig::default()
    };
    let (_, agent) = agent_with(Arc::new(RecordingTransport::default()), config);

    agent.start();
    agent.wait_initialized().await;

    assert!(agent.is_initialized());
}

#[tokio::test]
async fn dispose_releases_every_handle() {
    let transport = Arc::new(RecordingTransport::default());
    let (factory, agent) = agent(transport.clone());

    agent.preload_group("essential").await;
    agent.preload_group("animations").await;
    assert_eq!(agent.cache().len(), 5);

    agent.dispose().await;

    let mut released = factory.released.lock().unwrap().clone();
    released.sort();
    assert_eq!(
        released,
        vec![
            "handle:f0", "handle:f1", "handle:f2", "handle:font", "handle:logo"
        ]
    );
    assert_eq!(agent.get_image("logo"), None);
    assert_eq!(agent.preload_group("interactions").await, None);
    assert_eq!(transport.calls().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn dispose_cancels_running_loads() {
    let transport = Arc::new(RecordingTransport::slow(Duration::from_secs(10)));
    let (factory, agent) = agent(transport.clone());

    agent.start();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(agent.is_loading());

    agent.dispose().await;

    assert!(!agent.is_loading());
    assert!(!agent.is_initialized());
    assert_eq!(agent.group_state("essential"), GroupState::NotRequested);
    assert!(agent.cache().is_empty());
    assert_eq!(factory.created.load(Ordering::SeqCst), 0);
    // Returns at once: the agent was disposed before initializing.
    agent.wait_initialized().await;
}

#[tokio::test(start_paused = true)]
async fn waiting_for_background_group_returns_once_it_loads() {
    let transport = Arc::new(RecordingTransport::slow(Duration::from_millis(50)));
    let (_, agent) = agent(transport);

    agent.start();
    assert!(agent.wait_for_group("interactions").await);

    assert_eq!(agent.group_state("interactions"), GroupState::Loaded);
    assert!(agent.get_image("button").is_some());
    // Already loaded: returns at once.
    assert!(agent.wait_for_group("interactions").await);
    assert!(!agent.wait_for_group("missing").await);
}

#[tokio::test(start_paused = true)]
async fn waiting_for_a_group_ends_on_dispose() {
    let (_, agent) = agent(Arc::new(RecordingTransport::default()));

    // Nobody loads "animations", so only disposal ends the wait.
    let (loaded, ()) = tokio::join!(agent.wait_for_group("animations"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        agent.dispose().await;
    });

    assert!(!loaded);
    assert_eq!(agent.group_state("animations"), GroupState::NotRequested);
}

#[tokio::test]
async fn events_report_assets_and_groups() {
    let transport = Arc::new(RecordingTransport::default());
    let (_, agent) = agent(transport);
    let events = agent.events();

    agent.preload_group("interactions").await;

    let events: Vec<PreloadEvent> = events.drain().collect();
    assert!(events
        .iter()
        .any(|event| matches!(event, PreloadEvent::AssetLoaded { id } if id.as_str() == "button")));
    assert!(matches!(
        events.last(),
        Some(PreloadEvent::GroupSettled { group, report }) if group == "interactions" && report.loaded == 1
    ));
}

#[tokio::test]
async fn events_are_not_kept_without_subscribers() {
    let transport = Arc::new(RecordingTransport::default());
    transport
        .failing
        .lock()
        .unwrap()
        .insert("/img/f1.png".to_string());
    let (_, agent) = agent(transport);
    drop(agent.events());

    agent.preload_group("animations").await;
    for _ in 0..3 {
        agent.retry_group("animations").await;
    }
    agent.preload_group("essential").await;

    assert_eq!(agent.event_subscribers(), 0);
    let late = agent.events();
    assert!(late.is_empty());
    assert_eq!(agent.event_subscribers(), 1);
}

#[tokio::test]
async fn telemetry_counts_loads() {
    let metrics = MetricsRegistry::new();
    let agent: Agent = PreloadAgent::with_telemetry(
        Arc::new(RecordingTransport::default()),
        Arc::new(StringFactory::default()),
        registry(),
        PreloadConfig::default(),
        &metrics,
    )
    .unwrap();

    agent.preload_group("animations").await;

    let loaded = metrics
        .get_metric(&spool_core::telemetry::MetricId::new(
            "preload",
            "assets_loaded_total",
        ))
        .unwrap();
    assert_eq!(loaded.value.as_counter(), Some(3));
}

#[test]
fn invalid_configuration_is_rejected() {
    let config = PreloadConfig {
        concurrency_limit: 0,
        ..PreloadConfig::default()
    };
    let result = PreloadAgent::from_parts(
        Arc::new(RecordingTransport::default()),
        Arc::new(StringFactory::default()),
        registry(),
        config,
    );
    assert!(result.is_err());
}
