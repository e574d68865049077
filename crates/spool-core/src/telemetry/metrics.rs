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

//! Metric identifiers, values, and errors.

use std::fmt::{self, Display};
use thiserror::Error;

/// A structured identifier for a metric: a namespace, a name, and sorted labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId {
    /// The broad category of the metric (e.g. "preload").
    pub namespace: String,
    /// The metric's name (e.g. "assets_loaded_total").
    pub name: String,
    /// Key-value labels, kept sorted by key.
    pub labels: Vec<(String, String)>,
}

impl MetricId {
    /// Creates an unlabelled id.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            labels: Vec::new(),
        }
    }

    /// Adds a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self.labels.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)?;
        if !self.labels.is_empty() {
            let labels = self
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "[{labels}]")?;
        }
        Ok(())
    }
}

/// The kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// Only ever increases.
    Counter,
    /// Goes up and down.
    Gauge,
    /// A distribution of samples.
    Histogram,
}

/// The current value of a metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// A counter's total.
    Counter(u64),
    /// A gauge's last value.
    Gauge(f64),
    /// A histogram's buckets and totals.
    Histogram {
        /// The inclusive upper bound of each bucket, ascending.
        bucket_bounds: Vec<f64>,
        /// Samples at or below each bound (cumulative).
        bucket_counts: Vec<u64>,
        /// Number of samples observed.
        count: u64,
        /// Sum of all samples observed.
        sum: f64,
    },
}

impl MetricValue {
    /// The kind of this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
            MetricValue::Histogram { .. } => MetricType::Histogram,
        }
    }

    /// The counter total, if this is a counter.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            MetricValue::Counter(v) => Some(*v),
            _ => None,
        }
    }

    /// The gauge value, if this is a gauge.
    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            MetricValue::Gauge(v) => Some(*v),
            _ => None,
        }
    }

    /// The mean sample, if this is a non-empty histogram.
    pub fn mean(&self) -> Option<f64> {
        match self {
            MetricValue::Histogram { count, sum, .. } if *count > 0 => Some(sum / *count as f64),
            _ => None,
        }
    }
}

/// A metric: its id, a description, a unit, and its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// The metric's id.
    pub id: MetricId,
    /// What the metric measures.
    pub description: String,
    /// The unit of measurement (e.g. "ms", "count").
    pub unit: String,
    /// The current value.
    pub value: MetricValue,
}

impl Metric {
    /// A counter starting at zero.
    pub fn counter(id: MetricId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            unit: "count".to_owned(),
            value: MetricValue::Counter(0),
        }
    }

    /// A gauge starting at zero.
    pub fn gauge(id: MetricId, description: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            unit: unit.into(),
            value: MetricValue::Gauge(0.0),
        }
    }

    /// An empty histogram.
    ///
    /// # Errors
    /// Returns [`MetricsError::InvalidOperation`] if the bounds are empty or not ascending.
    pub fn histogram(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        bucket_bounds: Vec<f64>,
    ) -> MetricsResult<Self> {
        if bucket_bounds.is_empty() || bucket_bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MetricsError::InvalidOperation(format!(
                "histogram '{id}' needs strictly ascending bucket bounds"
            )));
        }
        let bucket_counts = vec![0; bucket_bounds.len()];
        Ok(Self {
            id,
            description: description.into(),
            unit: unit.into(),
            value: MetricValue::Histogram {
                bucket_bounds,
                bucket_counts,
                count: 0,
                sum: 0.0,
            },
        })
    }

    /// The kind of this metric.
    pub fn metric_type(&self) -> MetricType {
        self.value.metric_type()
    }
}

/// A specialized `Result` for metric operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error raised by the metrics system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// No metric with that id is registered.
    #[error("metric not found: {0}")]
    MetricNotFound(MetricId),
    /// The operation does not apply to the metric's kind.
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// The kind the operation needs.
        expected: MetricType,
        /// The kind that was found.
        found: MetricType,
    },
    /// The storage backend failed.
    #[error("storage error: {0}")]
    StorageError(String),
    /// The operation is not valid (e.g. bad histogram bounds).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_sorted_and_displayed() {
        let id = MetricId::new("preload", "fetch_time")
            .with_label("transport", "http")
            .with_label("group", "animations");

        assert_eq!(id.labels[0].0, "group");
        assert_eq!(
            id.to_string(),
            "preload:fetch_time[group=animations,transport=http]"
        );
        assert_eq!(MetricId::new("preload", "progress").to_string(), "preload:progress");
    }

    #[test]
    fn histogram_bounds_must_ascend() {
        let id = MetricId::new("preload", "fetch_time");
        assert!(Metric::histogram(id.clone(), "", "ms", vec![10.0, 5.0]).is_err());
        assert!(Metric::histogram(id.clone(), "", "ms", vec![]).is_err());
        assert!(Metric::histogram(id, "", "ms", vec![5.0, 10.0]).is_ok());
    }

    #[test]
    fn value_accessors_match_the_kind() {
        assert_eq!(MetricValue::Counter(3).as_counter(), Some(3));
        assert_eq!(MetricValue::Counter(3).as_gauge(), None);
        assert_eq!(MetricValue::Gauge(0.5).metric_type(), MetricType::Gauge);

        let histogram = MetricValue::Histogram {
            bucket_bounds: vec![1.0],
            bucket_counts: vec![2],
            count: 2,
            sum: 3.0,
        };
        assert_eq!(histogram.mean(), Some(1.5));
    }
}
