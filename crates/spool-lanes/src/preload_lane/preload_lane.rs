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

use super::{
    fetch_lane::FetchLane,
    metrics::LoaderMetrics,
    progress::{BatchObserver, ProgressTracker},
    schedule::{dedupe, priority_order},
};
use futures::future::join_all;
use spool_core::{
    AssetDescriptor, CancellationToken, HandleFactory, LoadError, LoadReport, PreloadConfig,
    Transport,
};
use spool_data::{AssetCache, Claim, FlightGuard, FlightOutcome, FlightWaiter, Lookup};
use spool_telemetry::ScopedMetricTimer;
use std::sync::Arc;

/// How one asset of a batch settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    CacheHit,
    Loaded,
    Failed,
    Joined,
    Cancelled,
}

/// Loads batches of descriptors into an [`AssetCache`].
///
/// At most `concurrency_limit` fetches run at once. Loads are started in
/// priority order (stable within a tier). Overlapping batches share loads:
/// an id is fetched by one batch while the others wait for its outcome.
pub struct PreloadLane<T: Transport, F: HandleFactory> {
    fetch: FetchLane<T>,
    cache: Arc<AssetCache<F>>,
    concurrency_limit: usize,
    metrics: Option<LoaderMetrics>,
}

impl<T: Transport, F: HandleFactory> PreloadLane<T, F> {
    /// Creates a lane. A `concurrency_limit` of zero is treated as one.
    pub fn new(fetch: FetchLane<T>, cache: Arc<AssetCache<F>>, concurrency_limit: usize) -> Self {
        Self {
            fetch,
            cache,
            concurrency_limit: concurrency_limit.max(1),
            metrics: None,
        }
    }

    /// Creates a lane configured from a [`PreloadConfig`].
    pub fn from_config(transport: T, cache: Arc<AssetCache<F>>, config: &PreloadConfig) -> Self {
        Self::new(
            FetchLane::from_config(transport, config),
            cache,
            config.concurrency_limit,
        )
    }

    /// Reports loads, failures, fetch times, and progress to `metrics`.
    pub fn with_metrics(mut self, metrics: LoaderMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The cache this lane fills.
    pub fn cache(&self) -> &Arc<AssetCache<F>> {
        &self.cache
    }

    /// The fetch lane used for every transport call.
    pub fn fetch_lane(&self) -> &FetchLane<T> {
        &self.fetch
    }

    /// The maximum number of fetches in flight at once.
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Loads every descriptor not already cached, without reporting progress.
    pub async fn preload_images(
        &self,
        descriptors: &[AssetDescriptor],
        cancel: &CancellationToken,
    ) -> LoadReport {
        self.preload_images_observed(descriptors, cancel, &BatchObserver::new())
            .await
    }

    /// Loads every descriptor not already cached, reporting each step to `observer`.
    ///
    /// Resolves once every asset settled, or once the batch noticed `cancel`.
    /// Cancellation stops in-flight fetches and keeps later chunks from
    /// starting; assets cached before it stay cached.
    pub async fn preload_images_observed(
        &self,
        descriptors: &[AssetDescriptor],
        cancel: &CancellationToken,
        observer: &BatchObserver,
    ) -> LoadReport {
        let batch = dedupe(descriptors);
        let tracker = ProgressTracker::new(batch.len(), observer, self.metrics.as_ref());
        let mut report = LoadReport {
            requested: batch.len(),
            ..LoadReport::default()
        };

        let mut pending = Vec::with_capacity(batch.len());
        let mut joining = Vec::new();
        for descriptor in batch {
            match self.cache.lookup(&descriptor.id) {
                Lookup::Cached(_) => {
                    tracker.settle();
                    report.cache_hits += 1;
                }
                Lookup::InFlight(waiter) => joining.push((descriptor, waiter)),
                Lookup::Missing => pending.push(descriptor),
            }
        }
        priority_order(&mut pending);

        log::debug!(
            "Batch of {} assets: {} cached, {} to fetch, {} loading elsewhere",
            report.requested,
            report.cache_hits,
            pending.len(),
            joining.len()
        );

        for (index, chunk) in pending.chunks(self.concurrency_limit).enumerate() {
            if cancel.is_cancelled() {
                log::debug!("Batch cancelled before chunk {index}");
                break;
            }
            log::trace!("Starting chunk {index} ({} assets)", chunk.len());
            let settled = join_all(
                chunk
                    .iter()
                    .map(|descriptor| self.load(descriptor, cancel, &tracker)),
            )
            .await;
            settled.into_iter().for_each(|outcome| record(&mut report, outcome));
        }

        for chunk in joining.chunks(self.concurrency_limit) {
            if cancel.is_cancelled() {
                break;
            }
            let settled = join_all(chunk.iter().map(|(descriptor, waiter)| {
                self.join(descriptor, waiter.clone(), cancel, &tracker)
            }))
            .await;
            settled.into_iter().for_each(|outcome| record(&mut report, outcome));
        }

        report.cancelled = report.requested
            - report.cache_hits
            - report.loaded
            - report.failed
            - report.joined;
        if report.cancelled > 0 {
            log::info!(
                "Batch cancelled: {}/{} assets ready, {} left unsettled",
                report.ready(),
                report.requested,
                report.cancelled
            );
        } else {
            log::debug!(
                "Batch settled: {}/{} assets ready, {} failed",
                report.ready(),
                report.requested,
                report.failed
            );
        }
        report
    }

    /// Loads one asset, fetching it unless it is cached or owned by another batch.
    async fn load(
        &self,
        descriptor: &AssetDescriptor,
        cancel: &CancellationToken,
        tracker: &ProgressTracker<'_>,
    ) -> Settled {
        loop {
            match self.cache.claim(&descriptor.id) {
                Claim::Cached(_) => {
                    tracker.settle();
                    return Settled::CacheHit;
                }
                Claim::Owner(guard) => return self.fetch_owned(descriptor, guard, cancel, tracker).await,
                Claim::Waiter(waiter) => match Self::wait(waiter, cancel).await {
                    Some(FlightOutcome::Abandoned) => continue,
                    Some(outcome) => return Self::settle_joined(descriptor, outcome, tracker),
                    None => return Settled::Cancelled,
                },
            }
        }
    }

    /// Waits on a load that was in flight when the batch was planned.
    async fn join(
        &self,
        descriptor: &AssetDescriptor,
        waiter: FlightWaiter,
        cancel: &CancellationToken,
        tracker: &ProgressTracker<'_>,
    ) -> Settled {
        match Self::wait(waiter, cancel).await {
            // The owner gave up; load it ourselves.
            Some(FlightOutcome::Abandoned) => self.load(descriptor, cancel, tracker).await,
            Some(outcome) => Self::settle_joined(descriptor, outcome, tracker),
            None => Settled::Cancelled,
        }
    }

    async fn wait(waiter: FlightWaiter, cancel: &CancellationToken) -> Option<FlightOutcome> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcome = waiter.wait() => Some(outcome),
        }
    }

    fn settle_joined(
        descriptor: &AssetDescriptor,
        outcome: FlightOutcome,
        tracker: &ProgressTracker<'_>,
    ) -> Settled {
        match outcome {
            FlightOutcome::Failed(error) => {
                tracker.failed(&descriptor.id, &error);
                Settled::Failed
            }
            _ => {
                tracker.settle();
                Settled::Joined
            }
        }
    }

    async fn fetch_owned(
        &self,
        descriptor: &AssetDescriptor,
        guard: FlightGuard,
        cancel: &CancellationToken,
        tracker: &ProgressTracker<'_>,
    ) -> Settled {
        let fetched = {
            let _timer = self
                .metrics
                .as_ref()
                .map(|metrics| ScopedMetricTimer::new(&metrics.fetch_time));
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    // Dropping the guard tells waiters the load was abandoned.
                    log::debug!("Fetch of '{}' aborted by cancellation", descriptor.id);
                    return Settled::Cancelled;
                }
                fetched = self.fetch.fetch(descriptor) => fetched,
            }
        };

        let handle = fetched.map_err(LoadError::from).and_then(|asset| {
            self.cache
                .factory()
                .create_handle(&descriptor.id, asset)
                .map_err(LoadError::from)
        });

        match handle {
            Ok(handle) => {
                self.cache.insert(descriptor.id.clone(), handle);
                guard.finish(FlightOutcome::Loaded);
                log::debug!("Loaded '{}'", descriptor.id);
                tracker.loaded(&descriptor.id);
                Settled::Loaded
            }
            Err(error) => {
                log::warn!("Failed to load '{}': {}", descriptor.id, error);
                self.cache.mark_failed(descriptor.id.clone(), error.clone());
                guard.finish(FlightOutcome::Failed(error.clone()));
                tracker.failed(&descriptor.id, &error);
                Settled::Failed
            }
        }
    }
}

fn record(report: &mut LoadReport, outcome: Settled) {
    match outcome {
        Settled::CacheHit => report.cache_hits += 1,
        Settled::Loaded => report.loaded += 1,
        Settled::Failed => report.failed += 1,
        Settled::Joined => report.joined += 1,
        Settled::Cancelled => {}
    }
}

impl<T: Transport, F: HandleFactory> std::fmt::Debug for PreloadLane<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadLane")
            .field("concurrency_limit", &self.concurrency_limit)
            .field("timeout", &self.fetch.timeout())
            .field("cache", &self.cache)
            .finish()
    }
}
