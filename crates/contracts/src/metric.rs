//! Metric and MetricBatch - the data model shared by every crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single measurement value.
///
/// Closed sum so sinks can match exhaustively instead of inspecting a
/// dynamic value at runtime. Serialized untagged: a bare JSON number or
/// string, matching the buffered-batch encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Numeric measurement
    Number(f64),
    /// Textual measurement (e.g. a status string)
    Text(String),
}

impl MetricValue {
    /// Numeric view of the value, if it is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One measurement produced by a source.
///
/// Immutable once produced. `name` is an opaque dotted identifier; batches
/// may contain repeated names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Dotted metric identifier
    pub name: String,

    /// Measurement instant (wall clock, UTC)
    pub time: DateTime<Utc>,

    /// Measured value
    pub value: MetricValue,
}

impl Metric {
    /// Create a metric from name, instant and value
    pub fn new(name: impl Into<String>, time: DateTime<Utc>, value: impl Into<MetricValue>) -> Self {
        Self {
            name: name.into(),
            time,
            value: value.into(),
        }
    }
}

/// Ordered set of metrics belonging to one fetch cycle.
///
/// Insertion order from the source is preserved end-to-end; sinks may rely
/// on it for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricBatch(Vec<Metric>);

impl MetricBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a metric, keeping insertion order
    pub fn push(&mut self, metric: Metric) {
        self.0.push(metric);
    }

    /// Number of metrics in the batch
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the batch holds no metrics
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate metrics in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Metric> {
        self.0.iter()
    }
}

impl From<Vec<Metric>> for MetricBatch {
    fn from(metrics: Vec<Metric>) -> Self {
        Self(metrics)
    }
}

impl IntoIterator for MetricBatch {
    type Item = Metric;
    type IntoIter = std::vec::IntoIter<Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MetricBatch {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
