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

//! The contract every metrics store fulfils.

use spool_core::telemetry::{Metric, MetricId, MetricType, MetricValue, MetricsError, MetricsResult};
use std::fmt::Debug;

/// A store of metrics.
///
/// Implementors provide storage and an atomic [`update`](Self::update); the
/// typed operations (`increment_counter`, `set_gauge`, ...) are built on it.
pub trait MetricsBackend: Send + Sync + Debug + 'static {
    /// Stores a metric, replacing any metric with the same id.
    fn put_metric(&self, metric: Metric) -> MetricsResult<()>;

    /// Returns a copy of a metric.
    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric>;

    /// Returns `true` if a metric with that id is stored.
    fn contains_metric(&self, id: &MetricId) -> bool;

    /// Returns a copy of every stored metric.
    fn list_all_metrics(&self) -> Vec<Metric>;

    /// Removes every metric.
    fn clear_all(&self) -> MetricsResult<()>;

    /// The number of stored metrics.
    fn metric_count(&self) -> usize;

    /// Applies `apply` to a metric's value while no other update can interleave.
    fn update(
        &self,
        id: &MetricId,
        apply: &mut dyn FnMut(&mut MetricValue) -> MetricsResult<()>,
    ) -> MetricsResult<()>;

    /// Adds `delta` to a counter and returns the new total.
    fn increment_counter(&self, id: &MetricId, delta: u64) -> MetricsResult<u64> {
        let mut total = 0;
        self.update(id, &mut |value| match value {
            MetricValue::Counter(current) => {
                *current = current.saturating_add(delta);
                total = *current;
                Ok(())
            }
            other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: other.metric_type(),
            }),
        })?;
        Ok(total)
    }

    /// Sets a gauge.
    fn set_gauge(&self, id: &MetricId, gauge: f64) -> MetricsResult<()> {
        self.update(id, &mut |value| match value {
            MetricValue::Gauge(current) => {
                *current = gauge;
                Ok(())
            }
            other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: other.metric_type(),
            }),
        })
    }

    /// Records one histogram sample.
    fn record_histogram_sample(&self, id: &MetricId, sample: f64) -> MetricsResult<()> {
        self.update(id, &mut |value| match value {
            MetricValue::Histogram {
                bucket_bounds,
                bucket_counts,
                count,
                sum,
            } => {
                for (bound, bucket) in bucket_bounds.iter().zip(bucket_counts.iter_mut()) {
                    if sample <= *bound {
                        *bucket += 1;
                    }
                }
                *count += 1;
                *sum += sample;
                Ok(())
            }
            other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Histogram,
                found: other.metric_type(),
            }),
        })
    }
}
