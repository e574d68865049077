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

use spool_core::telemetry::MetricsResult;
use spool_telemetry::{CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry};

const NAMESPACE: &str = "preload";

/// Upper bounds of the fetch-time histogram, in milliseconds.
const FETCH_TIME_BUCKETS_MS: [f64; 8] = [5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1_000.0, 5_000.0];

/// The metrics a [`PreloadLane`](super::PreloadLane) reports.
#[derive(Debug, Clone)]
pub struct LoaderMetrics {
    pub(crate) loaded: CounterHandle,
    pub(crate) failed: CounterHandle,
    pub(crate) fetch_time: HistogramHandle,
    pub(crate) progress: GaugeHandle,
}

impl LoaderMetrics {
    /// Registers the loader metrics in `registry`.
    pub fn register(registry: &MetricsRegistry) -> MetricsResult<Self> {
        Ok(Self {
            loaded: registry.register_counter(
                NAMESPACE,
                "assets_loaded_total",
                "Assets fetched, decoded, and cached",
            )?,
            failed: registry.register_counter(
                NAMESPACE,
                "assets_failed_total",
                "Assets whose fetch or decode failed",
            )?,
            fetch_time: registry.register_histogram(
                NAMESPACE,
                "fetch_time",
                "Time spent in the transport per asset",
                "ms",
                FETCH_TIME_BUCKETS_MS.to_vec(),
            )?,
            progress: registry.register_gauge(
                NAMESPACE,
                "progress",
                "Progress of the most recent batch",
                "%",
            )?,
        })
    }

    pub(crate) fn record_loaded(&self) {
        if let Err(e) = self.loaded.increment() {
            log::warn!("Failed to record loaded asset: {e}");
        }
    }

    pub(crate) fn record_failed(&self) {
        if let Err(e) = self.failed.increment() {
            log::warn!("Failed to record failed asset: {e}");
        }
    }

    pub(crate) fn record_progress(&self, percent: f32) {
        if let Err(e) = self.progress.set(f64::from(percent)) {
            log::warn!("Failed to record progress: {e}");
        }
    }
}
