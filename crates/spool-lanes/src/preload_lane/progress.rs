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

use super::metrics::LoaderMetrics;
use spool_core::{AssetId, EventBus, LoadError, LoadProgress, PreloadEvent};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Where a batch reports what happens to it.
///
/// Both outlets are optional. Events go to the subscribers of an
/// [`EventBus`]; progress snapshots go to a watch channel whose receivers
/// always see the latest value.
#[derive(Debug, Clone, Default)]
pub struct BatchObserver {
    events: Option<EventBus<PreloadEvent>>,
    progress: Option<Arc<watch::Sender<LoadProgress>>>,
}

impl BatchObserver {
    /// An observer that reports nowhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes every event on `events`.
    pub fn with_events(mut self, events: EventBus<PreloadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Publishes every progress snapshot to `progress`.
    pub fn with_progress(mut self, progress: Arc<watch::Sender<LoadProgress>>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub(crate) fn emit(&self, event: PreloadEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    fn publish(&self, progress: LoadProgress) {
        if let Some(sender) = &self.progress {
            sender.send_replace(progress);
        }
        self.emit(PreloadEvent::Progress(progress));
    }
}

/// Counts settled assets for one batch and reports each step.
///
/// Every asset settles exactly once. The count and the publication happen
/// under one lock, so observers see a non-decreasing sequence even when
/// assets settle from several tasks.
#[derive(Debug)]
pub struct ProgressTracker<'a> {
    completed: Mutex<usize>,
    total: usize,
    observer: &'a BatchObserver,
    metrics: Option<&'a LoaderMetrics>,
}

impl<'a> ProgressTracker<'a> {
    /// Starts tracking a batch of `total` assets and publishes the initial snapshot.
    pub fn new(total: usize, observer: &'a BatchObserver, metrics: Option<&'a LoaderMetrics>) -> Self {
        let tracker = Self {
            completed: Mutex::new(0),
            total,
            observer,
            metrics,
        };
        tracker.report(LoadProgress::new(0, total));
        tracker
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> LoadProgress {
        let completed = *self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        LoadProgress::new(completed, self.total)
    }

    /// Settles an asset that needed no work.
    pub fn settle(&self) {
        self.advance(None);
    }

    /// Settles an asset that was loaded by this batch.
    pub fn loaded(&self, id: &AssetId) {
        if let Some(metrics) = self.metrics {
            metrics.record_loaded();
        }
        self.advance(Some(PreloadEvent::AssetLoaded { id: id.clone() }));
    }

    /// Settles an asset whose load failed.
    pub fn failed(&self, id: &AssetId, error: &LoadError) {
        if let Some(metrics) = self.metrics {
            metrics.record_failed();
        }
        self.advance(Some(PreloadEvent::AssetFailed {
            id: id.clone(),
            error: error.clone(),
        }));
    }

    fn advance(&self, event: Option<PreloadEvent>) {
        let mut completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        *completed = (*completed + 1).min(self.total);
        if let Some(event) = event {
            self.observer.emit(event);
        }
        self.report(LoadProgress::new(*completed, self.total));
    }

    fn report(&self, progress: LoadProgress) {
        log::trace!("Batch progress {}/{}", progress.completed, progress.total);
        if let Some(metrics) = self.metrics {
            metrics.record_progress(progress.percent());
        }
        self.observer.publish(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_reports_complete_immediately() {
        let (sender, receiver) = watch::channel(LoadProgress::default());
        let observer = BatchObserver::new().with_progress(Arc::new(sender));

        let tracker = ProgressTracker::new(0, &observer, None);

        assert_eq!(receiver.borrow().percent(), 100.0);
        assert!(tracker.snapshot().is_complete());
    }

    #[test]
    fn every_settlement_is_published() {
        let events = EventBus::new();
        let received = events.subscribe();
        let observer = BatchObserver::new().with_events(events);
        let tracker = ProgressTracker::new(2, &observer, None);

        tracker.loaded(&AssetId::from("a"));
        tracker.failed(&AssetId::from("b"), &spool_core::DecodeError::Empty.into());

        let percents: Vec<f32> = received
            .drain()
            .filter_map(|event| match event {
                PreloadEvent::Progress(progress) => Some(progress.percent()),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn completed_never_overshoots() {
        let observer = BatchObserver::new();
        let tracker = ProgressTracker::new(1, &observer, None);
        tracker.settle();
        tracker.settle();
        assert_eq!(tracker.snapshot(), LoadProgress::new(1, 1));
    }
}
