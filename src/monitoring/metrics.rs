//! Metrics collection (§4.6): system / component / application samples,
//! recomputed at 1m/5m/15m/1h windows, capped at ~10,000 samples with
//! FIFO eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::types::{now_ms, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricScope {
    System,
    Component,
    Application,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub scope: MetricScope,
    pub name: String,
    pub value: f64,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
}

impl Window {
    pub const ALL: [Window; 4] = [
        Window::OneMinute,
        Window::FiveMinutes,
        Window::FifteenMinutes,
        Window::OneHour,
    ];

    fn secs(self) -> i64 {
        match self {
            Self::OneMinute => 60,
            Self::FiveMinutes => 5 * 60,
            Self::FifteenMinutes => 15 * 60,
            Self::OneHour => 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowAggregate {
    pub window: Window,
    pub count: usize,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// A single global time series of samples, keyed by metric name. One
/// writer (`record`), many readers (`aggregate`).
pub struct MetricsCollector {
    max_samples: usize,
    samples: RwLock<HashMap<String, VecDeque<MetricSample>>>,
}

impl MetricsCollector {
    pub fn new(max_samples: usize) -> Self {
        Self {
            max_samples,
            samples: RwLock::new(HashMap::new()),
        }
    }

    pub fn record(&self, scope: MetricScope, name: &str, value: f64) {
        let mut samples = self.samples.write().expect("lock poisoned");
        let series = samples.entry(name.to_string()).or_default();
        series.push_back(MetricSample {
            scope,
            name: name.to_string(),
            value,
            timestamp: now_ms(),
        });
        while series.len() > self.max_samples {
            series.pop_front();
        }
    }

    pub fn latest(&self, name: &str) -> Option<f64> {
        self.samples
            .read()
            .expect("lock poisoned")
            .get(name)
            .and_then(|s| s.back())
            .map(|s| s.value)
    }

    /// Recomputes percentile aggregates for `name` over every window.
    pub fn aggregate(&self, name: &str) -> Vec<WindowAggregate> {
        let samples = self.samples.read().expect("lock poisoned");
        let Some(series) = samples.get(name) else {
            return Vec::new();
        };
        let now = now_ms();
        Window::ALL
            .iter()
            .map(|&window| {
                let cutoff = now - window.secs() * 1000;
                let mut values: Vec<f64> = series
                    .iter()
                    .filter(|s| s.timestamp >= cutoff)
                    .map(|s| s.value)
                    .collect();
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                WindowAggregate {
                    window,
                    count: values.len(),
                    mean: mean(&values),
                    p50: percentile(&values, 0.50),
                    p95: percentile(&values, 0.95),
                    p99: percentile(&values, 0.99),
                }
            })
            .collect()
    }

    pub fn sample_count(&self, name: &str) -> usize {
        self.samples
            .read()
            .expect("lock poisoned")
            .get(name)
            .map_or(0, VecDeque::len)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// `values` must already be sorted ascending.
fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let idx = ((values.len() as f64 - 1.0) * p).round() as usize;
    values[idx.min(values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_over_empty_metric_is_empty() {
        let collector = MetricsCollector::new(10_000);
        assert!(collector.aggregate("cpu").is_empty());
    }

    #[test]
    fn fifo_eviction_caps_sample_count() {
        let collector = MetricsCollector::new(5);
        for i in 0..10 {
            collector.record(MetricScope::System, "cpu", i as f64);
        }
        assert_eq!(collector.sample_count("cpu"), 5);
    }

    #[test]
    fn percentiles_are_monotone() {
        let collector = MetricsCollector::new(10_000);
        for i in 1..=100 {
            collector.record(MetricScope::Application, "resp_time", i as f64);
        }
        let agg = collector
            .aggregate("resp_time")
            .into_iter()
            .find(|a| a.window == Window::OneHour)
            .unwrap();
        assert!(agg.p50 <= agg.p95);
        assert!(agg.p95 <= agg.p99);
    }
}
