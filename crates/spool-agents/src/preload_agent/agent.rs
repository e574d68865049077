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

//! The group coordinator.

use super::{
    group::{Admission, GroupState, GroupTable},
    task::TrackedTask,
};
use anyhow::{Context, Result};
use spool_core::{
    AssetRegistry, CancellationToken, EventBus, HandleFactory, LoadProgress, LoadReport,
    PreloadConfig, PreloadEvent, Transport,
};
use spool_data::{AssetCache, AssetStatus};
use spool_lanes::{BatchObserver, LoaderMetrics, PreloadLane};
use spool_telemetry::MetricsRegistry;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex, PoisonError,
};
use tokio::sync::watch;

/// State shared between the agent and the tasks it spawns.
struct Shared<T: Transport, F: HandleFactory> {
    lane: PreloadLane<T, F>,
    registry: Arc<AssetRegistry>,
    config: PreloadConfig,
    groups: GroupTable,
    root: CancellationToken,
    events: EventBus<PreloadEvent>,
    progress: Arc<watch::Sender<LoadProgress>>,
    batches_started: AtomicUsize,
    active_batches: AtomicUsize,
    initialized: watch::Sender<bool>,
    disposed: AtomicBool,
}

/// Completes once the flag behind `receiver` is set, or its sender is gone.
async fn settled(receiver: &mut watch::Receiver<bool>) {
    let _ = receiver.wait_for(|done| *done).await;
}

/// Decrements the active batch count when a batch ends, however it ends.
struct ActiveBatch<'a>(&'a AtomicUsize);

impl Drop for ActiveBatch<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<T: Transport + 'static, F: HandleFactory> Shared<T, F> {
    async fn preload_group(&self, name: &str, cancel: &CancellationToken) -> Option<LoadReport> {
        if self.disposed.load(Ordering::SeqCst) {
            log::debug!("Ignoring request for group '{name}' after disposal");
            return None;
        }

        let group = match self.registry.group(name) {
            Ok(group) => group,
            Err(e) => {
                log::warn!("{e}, nothing to preload");
                return None;
            }
        };

        let pending = match self.groups.admit(name) {
            Admission::Done => {
                log::trace!("Group '{name}' already loaded");
                return None;
            }
            Admission::Wait(mut receiver) => {
                log::debug!("Group '{name}' is loading, waiting for it");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = settled(&mut receiver) => {}
                }
                return None;
            }
            Admission::Load(pending) => pending,
        };

        log::info!("Preloading group '{}' ({} assets)", name, group.len());
        let report = self.run_batch(group.descriptors(), cancel).await;

        if cancel.is_cancelled() && report.cancelled > 0 {
            log::info!("Preloading group '{name}' was cancelled");
            // Dropping `pending` returns the group to NotRequested.
            return Some(report);
        }

        log::info!(
            "Group '{}' loaded: {}/{} assets ready, {} failed",
            name,
            report.ready(),
            report.requested,
            report.failed
        );
        pending.complete(report);
        self.events.publish(PreloadEvent::GroupSettled {
            group: name.to_owned(),
            report,
        });
        Some(report)
    }

    async fn run_batch(
        &self,
        descriptors: &[spool_core::AssetDescriptor],
        cancel: &CancellationToken,
    ) -> LoadReport {
        self.batches_started.fetch_add(1, Ordering::SeqCst);
        self.active_batches.fetch_add(1, Ordering::SeqCst);
        let _active = ActiveBatch(&self.active_batches);

        let observer = BatchObserver::new()
            .with_events(self.events.clone())
            .with_progress(self.progress.clone());
        self.lane
            .preload_images_observed(descriptors, cancel, &observer)
            .await
    }
}

/// Coordinates group loads over one cache.
///
/// One agent is created at the root of the application and shared with every
/// consumer. Call [`start`](Self::start) from within a Tokio runtime to load
/// the essential group (and, later, the background group), and
/// [`dispose`](Self::dispose) when the owning scope ends. Dropping the agent
/// cancels its tasks; handles are released once the last reference to the
/// cache goes away.
pub struct PreloadAgent<T: Transport + 'static, F: HandleFactory> {
    shared: Arc<Shared<T, F>>,
    tasks: Mutex<Vec<TrackedTask>>,
    started: AtomicBool,
}

impl<T: Transport + 'static, F: HandleFactory> PreloadAgent<T, F> {
    /// Creates an agent around an existing lane.
    ///
    /// # Errors
    /// Fails if `config` does not validate.
    pub fn new(
        lane: PreloadLane<T, F>,
        registry: Arc<AssetRegistry>,
        config: PreloadConfig,
    ) -> Result<Self> {
        config
            .validate()
            .context("Invalid preload configuration")?;
        for name in std::iter::once(&config.essential_group).chain(config.background_group.iter()) {
            if !registry.contains_group(name) {
                log::warn!("Configured group '{name}' is not declared in the registry");
            }
        }

        let (progress, _) = watch::channel(LoadProgress::default());
        let (initialized, _) = watch::channel(false);
        Ok(Self {
            shared: Arc::new(Shared {
                lane,
                registry,
                config,
                groups: GroupTable::default(),
                root: CancellationToken::new(),
                events: EventBus::new(),
                progress: Arc::new(progress),
                batches_started: AtomicUsize::new(0),
                active_batches: AtomicUsize::new(0),
                initialized,
                disposed: AtomicBool::new(false),
            }),
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        })
    }

    /// Creates an agent, its cache, and its lane from a transport and a factory.
    ///
    /// # Errors
    /// Fails if `config` does not validate.
    pub fn from_parts(
        transport: T,
        factory: Arc<F>,
        registry: Arc<AssetRegistry>,
        config: PreloadConfig,
    ) -> Result<Self> {
        let cache = Arc::new(AssetCache::new(factory));
        let lane = PreloadLane::from_config(transport, cache, &config);
        Self::new(lane, registry, config)
    }

    /// Like [`from_parts`](Self::from_parts), reporting loader metrics to `metrics`.
    ///
    /// # Errors
    /// Fails if `config` does not validate or the metrics cannot be registered.
    pub fn with_telemetry(
        transport: T,
        factory: Arc<F>,
        registry: Arc<AssetRegistry>,
        config: PreloadConfig,
        metrics: &MetricsRegistry,
    ) -> Result<Self> {
        let loader_metrics =
            LoaderMetrics::register(metrics).context("Failed to register loader metrics")?;
        let cache = Arc::new(AssetCache::new(factory));
        let lane = PreloadLane::from_config(transport, cache, &config).with_metrics(loader_metrics);
        Self::new(lane, registry, config)
    }

    /// Spawns the startup loads.
    ///
    /// The essential group is loaded first; once it settled (whatever the
    /// outcome of its assets) the agent counts as initialized. The background
    /// group, if configured, starts `background_delay_ms` later as a separate
    /// task. Calling `start` again does nothing.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let essential = {
            let shared = self.shared.clone();
            let cancel = self.shared.root.child();
            let token = cancel.clone();
            let handle = tokio::spawn(async move {
                let name = shared.config.essential_group.clone();
                shared.preload_group(&name, &token).await;
                if !token.is_cancelled() {
                    shared.initialized.send_replace(true);
                    log::info!("Preloader initialized");
                }
            });
            TrackedTask {
                label: "essential",
                cancel,
                handle,
            }
        };

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.push(essential);

        if let Some(name) = self.shared.config.background_group.clone() {
            let shared = self.shared.clone();
            let cancel = self.shared.root.child();
            let token = cancel.clone();
            let mut initialized = self.shared.initialized.subscribe();
            let handle = tokio::spawn(async move {
                let delay = shared.config.background_delay();
                let ready = async {
                    settled(&mut initialized).await;
                    tokio::time::sleep(delay).await;
                };
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = ready => {}
                }
                log::debug!("Starting background preload of '{name}'");
                shared.preload_group(&name, &token).await;
            });
            tasks.push(TrackedTask {
                label: "background",
                cancel,
                handle,
            });
        }
    }

    /// Loads a group unless it is already loaded.
    ///
    /// Returns the batch report if this call ran the load, `None` if the
    /// group was already loaded, is unknown, or was loaded by a concurrent
    /// call this one waited on.
    pub async fn preload_group(&self, name: &str) -> Option<LoadReport> {
        self.shared.preload_group(name, &self.shared.root).await
    }

    /// Loads a group again, fetching only its missing and failed assets.
    pub async fn retry_group(&self, name: &str) -> Option<LoadReport> {
        if self.shared.groups.forget_loaded(name) {
            log::info!("Retrying group '{name}'");
        }
        self.preload_group(name).await
    }

    /// Waits until the group `name` is loaded, by this agent's startup
    /// tasks or by any other caller.
    ///
    /// Returns `false` without waiting if the group is not declared, and
    /// returns `false` as soon as the agent is disposed.
    pub async fn wait_for_group(&self, name: &str) -> bool {
        if !self.shared.registry.contains_group(name) {
            log::warn!("Cannot wait for undeclared group '{name}'");
            return false;
        }

        let mut changes = self.shared.groups.subscribe();
        loop {
            if self.shared.groups.state(name) == GroupState::Loaded {
                return true;
            }
            tokio::select! {
                biased;
                _ = self.shared.root.cancelled() => return false,
                changed = changes.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    /// Returns the cached handle for `id`, if it is loaded.
    pub fn get_image(&self, id: &str) -> Option<F::Handle> {
        self.shared.lane.cache().get(id)
    }

    /// Reports whether `id` is absent, loading, ready, or failed.
    pub fn image_status(&self, id: &str) -> AssetStatus<F::Handle> {
        self.shared.lane.cache().status(id)
    }

    /// The state of a group.
    pub fn group_state(&self, name: &str) -> GroupState {
        self.shared.groups.state(name)
    }

    /// The report of a loaded group's last load.
    pub fn group_report(&self, name: &str) -> Option<LoadReport> {
        self.shared.groups.report(name)
    }

    /// The names of the loaded groups, sorted.
    pub fn loaded_groups(&self) -> Vec<String> {
        self.shared.groups.loaded()
    }

    /// The progress of the most recent or ongoing batch, in `[0, 100]`.
    ///
    /// Zero until a batch has started. Every batch publishes into the same
    /// slot, so while batches overlap this is the latest snapshot of
    /// whichever batch reported last: a batch starting at `0/n` can make the
    /// value drop while another one is further along. Within one batch the
    /// value never decreases.
    pub fn loading_progress(&self) -> f32 {
        if self.shared.batches_started.load(Ordering::SeqCst) == 0 {
            return 0.0;
        }
        self.shared.progress.borrow().percent()
    }

    /// A receiver that always holds the latest progress snapshot.
    pub fn progress_receiver(&self) -> watch::Receiver<LoadProgress> {
        self.shared.progress.subscribe()
    }

    /// Returns `true` while at least one batch is running.
    pub fn is_loading(&self) -> bool {
        self.shared.active_batches.load(Ordering::SeqCst) > 0
    }

    /// Returns `true` once the essential group settled.
    pub fn is_initialized(&self) -> bool {
        *self.shared.initialized.borrow()
    }

    /// Waits until the essential group settled.
    ///
    /// Returns immediately if the agent was disposed before that happened.
    pub async fn wait_initialized(&self) {
        let mut initialized = self.shared.initialized.subscribe();
        tokio::select! {
            biased;
            _ = settled(&mut initialized) => {}
            _ = self.shared.root.cancelled() => {}
        }
    }

    /// Subscribes to preload events.
    ///
    /// The receiver sees every event published after this call. Events
    /// published while nobody is subscribed are dropped, and dropping the
    /// receiver unsubscribes it.
    pub fn events(&self) -> flume::Receiver<PreloadEvent> {
        self.shared.events.subscribe()
    }

    /// The number of live event subscribers.
    pub fn event_subscribers(&self) -> usize {
        self.shared.events.subscriber_count()
    }

    /// The cache shared by every consumer of this agent.
    pub fn cache(&self) -> &Arc<AssetCache<F>> {
        self.shared.lane.cache()
    }

    /// The registry groups are looked up in.
    pub fn registry(&self) -> &AssetRegistry {
        &self.shared.registry
    }

    /// The configuration the agent runs with.
    pub fn config(&self) -> &PreloadConfig {
        &self.shared.config
    }

    /// Cancels every running load, waits for the tracked tasks to stop, and
    /// releases every cached handle.
    ///
    /// Later `preload_group` calls do nothing. Calling `dispose` twice is harmless.
    pub async fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        log::info!("Disposing preloader");
        self.shared.root.cancel();

        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            task.shutdown().await;
        }

        let released = self.shared.lane.cache().release_all();
        log::debug!("Released {released} handles on disposal");
    }
}

impl<T: Transport + 'static, F: HandleFactory> Drop for PreloadAgent<T, F> {
    fn drop(&mut self) {
        self.shared.root.cancel();
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl<T: Transport + 'static, F: HandleFactory> std::fmt::Debug for PreloadAgent<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadAgent")
            .field("loaded_groups", &self.loaded_groups())
            .field("is_loading", &self.is_loading())
            .field("is_initialized", &self.is_initialized())
            .finish()
    }
}
