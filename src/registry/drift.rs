use serde::{Deserialize, Serialize};

use crate::types::PerformanceSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftSeverity {
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DriftIndicator {
    pub detected: bool,
    pub severity: Option<DriftSeverity>,
    pub magnitude: f64,
}

const DETECTED_THRESHOLD: f64 = 0.05;
const HIGH_SEVERITY_THRESHOLD: f64 = 0.15;

/// `magnitude = |mean(last 10) - mean(prev 10)| / mean(prev 10)`, per
/// §4.4's canonical drift computation.
pub fn compute(history: &[PerformanceSample]) -> DriftIndicator {
    if history.len() < 20 {
        return DriftIndicator {
            detected: false,
            severity: None,
            magnitude: 0.0,
        };
    }

    let n = history.len();
    let last_10 = &history[n - 10..];
    let prev_10 = &history[n - 20..n - 10];

    let mean_last = last_10.iter().map(|s| s.overall).sum::<f64>() / 10.0;
    let mean_prev = prev_10.iter().map(|s| s.overall).sum::<f64>() / 10.0;

    if mean_prev.abs() < f64::EPSILON {
        return DriftIndicator {
            detected: false,
            severity: None,
            magnitude: 0.0,
        };
    }

    let magnitude = (mean_last - mean_prev).abs() / mean_prev;
    let detected = magnitude > DETECTED_THRESHOLD;
    let severity = if !detected {
        None
    } else if magnitude > HIGH_SEVERITY_THRESHOLD {
        Some(DriftSeverity::High)
    } else {
        Some(DriftSeverity::Medium)
    };

    DriftIndicator {
        detected,
        severity,
        magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(overall: f64) -> PerformanceSample {
        PerformanceSample {
            overall,
            metrics: Default::default(),
            timestamp: 0,
        }
    }

    #[test]
    fn fewer_than_20_samples_means_no_drift() {
        let history: Vec<_> = (0..15).map(|_| sample(0.8)).collect();
        let drift = compute(&history);
        assert!(!drift.detected);
    }

    #[test]
    fn large_drop_is_high_severity() {
        let mut history: Vec<_> = (0..10).map(|_| sample(0.9)).collect();
        history.extend((0..10).map(|_| sample(0.6)));
        let drift = compute(&history);
        assert!(drift.detected);
        assert_eq!(drift.severity, Some(DriftSeverity::High));
    }
}
