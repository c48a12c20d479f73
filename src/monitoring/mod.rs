//! Monitoring & Alerting (C6)
//!
//! Three cooperating subsystems: metrics collection with windowed
//! aggregation, the alert state machine, and the incident state
//! machine with deterministic auto-recovery.

mod alerts;
mod incidents;
pub mod metrics;
pub mod recovery;
pub mod system;

pub use alerts::AlertManager;
pub use incidents::IncidentManager;
pub use metrics::{MetricScope, MetricsCollector, Window, WindowAggregate};
pub use recovery::{Procedure, RecoveryOutcome};
pub use system::{SystemMetricsSource, SystemSample};

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::{AlertThresholds, EscalationRules};
use crate::error::{MonitoringError, Result};
use crate::types::{Alert, Incident, Monitor};

/// Declarative monitor registry plus the three subsystems it drives.
pub struct MonitoringSystem {
    monitors: RwLock<HashMap<String, Monitor>>,
    pub metrics: MetricsCollector,
    pub alerts: AlertManager,
    pub incidents: IncidentManager,
    alert_thresholds: AlertThresholds,
    escalation_rules: EscalationRules,
}

impl MonitoringSystem {
    pub fn new(max_metric_samples: usize, alert_thresholds: AlertThresholds, escalation_rules: EscalationRules) -> Self {
        let system = Self {
            monitors: RwLock::new(HashMap::new()),
            metrics: MetricsCollector::new(max_metric_samples),
            alerts: AlertManager::new(),
            incidents: IncidentManager::new(),
            alert_thresholds,
            escalation_rules,
        };
        system.register_default_monitors();
        system
    }

    fn register_default_monitors(&self) {
        let defaults = [
            ("cpu_usage", None, self.alert_thresholds.cpu_usage_pct),
            ("memory_usage", None, self.alert_thresholds.memory_usage_pct),
            ("error_rate", None, self.alert_thresholds.error_rate_pct),
            ("response_time", None, self.alert_thresholds.response_time_ms),
            ("throughput_drop", None, self.alert_thresholds.throughput_drop_pct),
        ];
        let mut monitors = self.monitors.write().expect("lock poisoned");
        for (name, component, critical) in defaults {
            monitors.insert(
                name.to_string(),
                Monitor {
                    name: name.to_string(),
                    r#type: crate::types::MonitorType::System,
                    component: component.map(str::to_string),
                    interval_secs: 60,
                    warning_threshold: critical * 0.8,
                    critical_threshold: critical,
                    enabled: true,
                },
            );
        }
    }

    pub fn register_monitor(&self, monitor: Monitor) {
        self.monitors.write().expect("lock poisoned").insert(monitor.name.clone(), monitor);
    }

    pub fn monitors(&self) -> Vec<Monitor> {
        self.monitors.read().expect("lock poisoned").values().cloned().collect()
    }

    /// Records a measurement and runs it through the alert state
    /// machine in one step, matching §4.6's "every monitor's
    /// measurement is compared to its thresholds" framing.
    pub fn observe(&self, monitor_name: &str, value: f64) -> Result<Option<String>> {
        let monitor = self
            .monitors
            .read()
            .expect("lock poisoned")
            .get(monitor_name)
            .cloned()
            .ok_or_else(|| MonitoringError::MonitorNotRegistered(monitor_name.to_string()))?;
        if !monitor.enabled {
            return Ok(None);
        }
        self.metrics.record(MetricScope::System, monitor_name, value);
        Ok(self.alerts.evaluate(
            monitor_name,
            monitor_name,
            value,
            monitor.warning_threshold,
            monitor.critical_threshold,
        ))
    }

    /// One management tick: escalate overdue alerts, detect new
    /// incidents from the current active alert set, and auto-resolve
    /// incidents whose alerts have all cleared.
    pub fn management_tick(&self) -> (Vec<String>, Vec<Incident>, Vec<String>) {
        let escalated = self.alerts.escalate_tick(&self.escalation_rules);
        let active = self.alerts.active();
        let created = self.incidents.detect_tick(&active);
        let all_alerts = self.alerts.all();
        let auto_resolved = self.incidents.auto_resolve_tick(&all_alerts);
        (escalated, created, auto_resolved)
    }

    /// Samples process resource usage and feeds it through `cpu_usage`
    /// and `memory_usage` in one step, for the periodic monitoring tick.
    pub fn observe_system(&self, source: &SystemMetricsSource) -> Result<Vec<String>> {
        let sample = source.sample();
        let mut raised = Vec::new();
        if let Some(id) = self.observe("cpu_usage", sample.cpu_usage_pct)? {
            raised.push(id);
        }
        if let Some(id) = self.observe("memory_usage", sample.memory_usage_pct)? {
            raised.push(id);
        }
        Ok(raised)
    }

    pub fn acknowledge_alert(&self, id: &str) -> Result<()> {
        self.alerts.acknowledge(id)
    }

    pub fn resolve_incident(&self, id: &str, resolution: &str) -> Result<()> {
        self.incidents.resolve(id, resolution)
    }

    pub fn restore(alerts: Vec<Alert>, incidents: Vec<Incident>, alert_thresholds: AlertThresholds, escalation_rules: EscalationRules, max_metric_samples: usize) -> Self {
        let system = Self {
            monitors: RwLock::new(HashMap::new()),
            metrics: MetricsCollector::new(max_metric_samples),
            alerts: AlertManager::restore(alerts),
            incidents: IncidentManager::restore(incidents),
            alert_thresholds,
            escalation_rules,
        };
        system.register_default_monitors();
        system
    }

    pub fn snapshot_alerts(&self) -> Vec<Alert> {
        self.alerts.all()
    }

    pub fn snapshot_incidents(&self) -> Vec<Incident> {
        self.incidents.all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_unknown_monitor_is_not_found() {
        let system = MonitoringSystem::new(1000, AlertThresholds::default(), EscalationRules::default());
        let err = system.observe("nonexistent", 1.0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn observe_above_critical_raises_alert() {
        let system = MonitoringSystem::new(1000, AlertThresholds::default(), EscalationRules::default());
        let id = system.observe("cpu_usage", 92.0).unwrap();
        assert!(id.is_some());
        assert_eq!(system.alerts.active().len(), 1);
    }
}
