//! Alert state machine (§4.6). A monitor's measurement against its
//! thresholds produces or updates an `Alert`; the same `(monitor,
//! metric)` pair de-duplicates into a single active alert (incrementing
//! `occurrences`, keeping the oldest `timestamp`).
//!
//! Transitions: `active -> acknowledged` (manual, or by a successful
//! auto-recovery), `active -> resolved` (measurement back below warning
//! for 2 consecutive evaluations), `active -> escalated` (orthogonal
//! flag, age past the severity's escalation timeout). Resolved alerts
//! are purged after the retention window.

use std::sync::RwLock;

use crate::error::{MonitoringError, Result};
use crate::types::{now_ms, Alert, AlertSeverity};

pub struct AlertManager {
    alerts: RwLock<Vec<Alert>>,
}

impl AlertManager {
    pub fn new() -> Self {
        Self {
            alerts: RwLock::new(Vec::new()),
        }
    }

    pub fn restore(alerts: Vec<Alert>) -> Self {
        Self {
            alerts: RwLock::new(alerts),
        }
    }

    /// Compares `value` to `(warning, critical)` for `monitor`/`metric`
    /// and applies the resulting transition. Returns the alert id that
    /// was created, de-duplicated into, or resolved, if any.
    pub fn evaluate(
        &self,
        monitor: &str,
        metric: &str,
        value: f64,
        warning: f64,
        critical: f64,
    ) -> Option<String> {
        let mut alerts = self.alerts.write().expect("lock poisoned");
        let existing_idx = alerts
            .iter()
            .position(|a| a.monitor == monitor && a.metric == metric && !a.resolved);

        if value > critical {
            return Some(self.raise(&mut alerts, existing_idx, monitor, metric, value, critical, AlertSeverity::Critical));
        }
        if value > warning {
            return Some(self.raise(&mut alerts, existing_idx, monitor, metric, value, warning, AlertSeverity::Medium));
        }

        // Below warning: advance the resolve streak for any active alert.
        if let Some(idx) = existing_idx {
            let alert = &mut alerts[idx];
            alert.below_warning_streak += 1;
            if alert.below_warning_streak >= 2 {
                alert.resolved = true;
                tracing::info!(alert_id = %alert.id, monitor, metric, "alert resolved");
                return Some(alert.id.clone());
            }
        }
        None
    }

    fn raise(
        &self,
        alerts: &mut Vec<Alert>,
        existing_idx: Option<usize>,
        monitor: &str,
        metric: &str,
        value: f64,
        threshold: f64,
        severity: AlertSeverity,
    ) -> String {
        if let Some(idx) = existing_idx {
            let alert = &mut alerts[idx];
            alert.occurrences += 1;
            alert.below_warning_streak = 0;
            alert.value = value;
            // Severity can escalate in place (warning measurement
            // followed later by a critical one) but timestamp and id
            // stay put — this is still "the same" de-duplicated alert.
            if severity > alert.severity {
                alert.severity = severity;
            }
            return alert.id.clone();
        }

        let id = format!("alert-{monitor}-{metric}-{}", now_ms());
        let alert = Alert {
            id: id.clone(),
            monitor: monitor.to_string(),
            severity,
            metric: metric.to_string(),
            value,
            threshold,
            message: format!("{monitor}.{metric} = {value:.2} exceeds threshold {threshold:.2}"),
            timestamp: now_ms(),
            acknowledged: false,
            escalated: false,
            escalated_to: None,
            resolved: false,
            below_warning_streak: 0,
            occurrences: 1,
            correlation_id: None,
        };
        tracing::warn!(alert_id = %id, monitor, metric, value, ?severity, "alert raised");
        alerts.push(alert);
        id
    }

    /// Escalates every active alert older than its severity's timeout.
    /// Returns the ids newly escalated this tick.
    pub fn escalate_tick(
        &self,
        escalation_rules: &crate::config::EscalationRules,
    ) -> Vec<String> {
        let mut alerts = self.alerts.write().expect("lock poisoned");
        let now = now_ms();
        let mut escalated = Vec::new();
        for alert in alerts.iter_mut() {
            if alert.resolved || alert.escalated {
                continue;
            }
            if let Some((timeout_secs, target)) = escalation_rules.timeout_and_target(alert.severity) {
                let age_secs = (now - alert.timestamp) / 1000;
                if age_secs >= timeout_secs as i64 {
                    alert.escalated = true;
                    alert.escalated_to = Some(match alert.severity {
                        AlertSeverity::Critical => "admin",
                        AlertSeverity::High => "team",
                        AlertSeverity::Medium => "monitoring",
                        AlertSeverity::Low => "monitoring",
                    });
                    let _ = target;
                    escalated.push(alert.id.clone());
                    tracing::warn!(alert_id = %alert.id, target = alert.escalated_to, "alert escalated");
                }
            }
        }
        escalated
    }

    pub fn acknowledge(&self, id: &str) -> Result<()> {
        let mut alerts = self.alerts.write().expect("lock poisoned");
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| MonitoringError::AlertNotFound(id.to_string()))?;
        if alert.resolved {
            return Err(crate::error::CladcError::Conflict(format!(
                "alert {id} is already resolved"
            )));
        }
        alert.acknowledged = true;
        Ok(())
    }

    /// Marks every alert in `ids` acknowledged — used by incident
    /// auto-recovery on success.
    pub fn acknowledge_many(&self, ids: &[String]) {
        let mut alerts = self.alerts.write().expect("lock poisoned");
        for alert in alerts.iter_mut() {
            if ids.contains(&alert.id) && !alert.resolved {
                alert.acknowledged = true;
            }
        }
    }

    pub fn purge_resolved(&self, retention_secs: u64) -> usize {
        let cutoff = now_ms() - retention_secs as i64 * 1000;
        let mut alerts = self.alerts.write().expect("lock poisoned");
        let before = alerts.len();
        alerts.retain(|a| !(a.resolved && a.timestamp < cutoff));
        before - alerts.len()
    }

    pub fn active(&self) -> Vec<Alert> {
        self.alerts
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|a| !a.resolved)
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Alert> {
        self.alerts.read().expect("lock poisoned").clone()
    }

    pub fn get(&self, id: &str) -> Result<Alert> {
        self.alerts
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| MonitoringError::AlertNotFound(id.to_string()).into())
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EscalationRules;

    #[test]
    fn critical_breach_raises_single_critical_alert() {
        let manager = AlertManager::new();
        manager.evaluate("cpu_monitor", "cpu_usage", 92.0, 80.0, 95.0);
        let active = manager.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn repeated_breach_deduplicates_and_counts_occurrences() {
        let manager = AlertManager::new();
        manager.evaluate("cpu_monitor", "cpu_usage", 92.0, 80.0, 95.0);
        manager.evaluate("cpu_monitor", "cpu_usage", 93.0, 80.0, 95.0);
        let active = manager.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].occurrences, 2);
    }

    #[test]
    fn simultaneous_warning_and_critical_only_surfaces_critical() {
        let manager = AlertManager::new();
        // A single evaluate() call per metric per tick always resolves
        // to the higher severity — there is no way to "also" raise a
        // warning for the same reading.
        manager.evaluate("cpu_monitor", "cpu_usage", 92.0, 80.0, 85.0);
        let active = manager.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn two_consecutive_below_warning_resolves() {
        let manager = AlertManager::new();
        manager.evaluate("cpu_monitor", "cpu_usage", 92.0, 80.0, 95.0);
        manager.evaluate("cpu_monitor", "cpu_usage", 50.0, 80.0, 95.0);
        assert_eq!(manager.active().len(), 1);
        manager.evaluate("cpu_monitor", "cpu_usage", 50.0, 80.0, 95.0);
        assert_eq!(manager.active().len(), 0);
    }

    #[test]
    fn escalates_after_timeout() {
        let manager = AlertManager::new();
        let id = manager.evaluate("cpu_monitor", "cpu_usage", 92.0, 80.0, 95.0).unwrap();
        {
            let mut alerts = manager.alerts.write().unwrap();
            let alert = alerts.iter_mut().find(|a| a.id == id).unwrap();
            alert.timestamp = now_ms() - 6 * 60 * 1000;
        }
        let escalated = manager.escalate_tick(&EscalationRules::default());
        assert_eq!(escalated, vec![id]);
        assert!(manager.active()[0].escalated);
    }

    #[test]
    fn acknowledging_resolved_alert_is_conflict() {
        let manager = AlertManager::new();
        let id = manager.evaluate("cpu_monitor", "cpu_usage", 92.0, 80.0, 95.0).unwrap();
        manager.evaluate("cpu_monitor", "cpu_usage", 50.0, 80.0, 95.0);
        manager.evaluate("cpu_monitor", "cpu_usage", 50.0, 80.0, 95.0);
        let err = manager.acknowledge(&id).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Conflict);
    }
}
