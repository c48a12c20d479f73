//! Incident state machine (§4.6). An incident correlates alerts sharing
//! a component prefix (>= 3 active) or a single `critical` alert, and
//! is managed as one unit through detection, investigation, recovery,
//! and resolution.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::{MonitoringError, Result};
use crate::types::{now_ms, Alert, AlertSeverity, Incident, IncidentStatus};

const AUTO_RESOLVE_MIN_AGE_SECS: i64 = 5 * 60;
const CLUSTER_THRESHOLD: usize = 3;

pub struct IncidentManager {
    incidents: RwLock<Vec<Incident>>,
}

impl IncidentManager {
    pub fn new() -> Self {
        Self {
            incidents: RwLock::new(Vec::new()),
        }
    }

    pub fn restore(incidents: Vec<Incident>) -> Self {
        Self {
            incidents: RwLock::new(incidents),
        }
    }

    /// Evaluates the current active alert set and opens new incidents
    /// for component clusters (>= 3 active alerts sharing a prefix) or
    /// lone critical alerts not already covered by an open incident.
    /// The snapshot of `alerts` passed in is the "consistent snapshot at
    /// creation time" the ordering guarantee requires.
    pub fn detect_tick(&self, alerts: &[Alert]) -> Vec<Incident> {
        let mut incidents = self.incidents.write().expect("lock poisoned");
        let already_covered: HashSet<String> = incidents
            .iter()
            .filter(|i| i.status != IncidentStatus::Resolved)
            .flat_map(|i| i.related_alerts.iter().cloned())
            .collect();

        let mut by_component: HashMap<String, Vec<&Alert>> = HashMap::new();
        for alert in alerts.iter().filter(|a| !a.resolved) {
            let prefix = component_prefix(&alert.monitor);
            by_component.entry(prefix).or_default().push(alert);
        }

        let mut created = Vec::new();

        for (component, group) in &by_component {
            let uncovered: Vec<&&Alert> = group.iter().filter(|a| !already_covered.contains(&a.id)).collect();
            if uncovered.len() >= CLUSTER_THRESHOLD {
                let related_alerts: Vec<String> = uncovered.iter().map(|a| a.id.clone()).collect();
                let severity = uncovered.iter().map(|a| a.severity).max().unwrap_or(AlertSeverity::Medium);
                let incident = new_incident(component.clone(), severity, related_alerts);
                tracing::warn!(incident_id = %incident.id, component, "incident detected: clustered alerts");
                created.push(incident.clone());
                incidents.push(incident);
            }
        }

        for alert in alerts.iter().filter(|a| !a.resolved && a.severity == AlertSeverity::Critical) {
            if already_covered.contains(&alert.id) {
                continue;
            }
            if created.iter().any(|i| i.related_alerts.contains(&alert.id)) {
                continue;
            }
            let component = component_prefix(&alert.monitor);
            let incident = new_incident(component.clone(), AlertSeverity::Critical, vec![alert.id.clone()]);
            tracing::warn!(incident_id = %incident.id, component, "incident detected: critical alert");
            created.push(incident.clone());
            incidents.push(incident);
        }

        created
    }

    pub fn mark_investigating(&self, id: &str) -> Result<()> {
        let mut incidents = self.incidents.write().expect("lock poisoned");
        let incident = incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| MonitoringError::IncidentNotFound(id.to_string()))?;
        if incident.status == IncidentStatus::Detected {
            incident.status = IncidentStatus::Investigating;
            incident.investigating_at = Some(now_ms());
        }
        Ok(())
    }

    pub fn mark_recovered(&self, id: &str) -> Result<()> {
        let mut incidents = self.incidents.write().expect("lock poisoned");
        let incident = incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| MonitoringError::IncidentNotFound(id.to_string()))?;
        incident.status = IncidentStatus::Recovered;
        incident.recovered_at = Some(now_ms());
        Ok(())
    }

    pub fn resolve(&self, id: &str, _resolution: &str) -> Result<()> {
        let mut incidents = self.incidents.write().expect("lock poisoned");
        let incident = incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| MonitoringError::IncidentNotFound(id.to_string()))?;
        incident.status = IncidentStatus::Resolved;
        incident.resolved_at = Some(now_ms());
        Ok(())
    }

    /// Auto-resolves any incident whose related alerts are all resolved
    /// and which is older than the 5-minute minimum age.
    pub fn auto_resolve_tick(&self, alerts: &[Alert]) -> Vec<String> {
        let mut incidents = self.incidents.write().expect("lock poisoned");
        let now = now_ms();
        let mut resolved = Vec::new();
        for incident in incidents.iter_mut() {
            if incident.status == IncidentStatus::Resolved {
                continue;
            }
            let age_secs = (now - incident.detected_at) / 1000;
            if age_secs < AUTO_RESOLVE_MIN_AGE_SECS {
                continue;
            }
            let all_resolved = incident.related_alerts.iter().all(|alert_id| {
                alerts
                    .iter()
                    .find(|a| &a.id == alert_id)
                    .map_or(true, |a| a.resolved)
            });
            if all_resolved {
                incident.status = IncidentStatus::Resolved;
                incident.resolved_at = Some(now);
                resolved.push(incident.id.clone());
                tracing::info!(incident_id = %incident.id, "incident auto-resolved");
            }
        }
        resolved
    }

    pub fn all(&self) -> Vec<Incident> {
        self.incidents.read().expect("lock poisoned").clone()
    }

    pub fn get(&self, id: &str) -> Result<Incident> {
        self.incidents
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| MonitoringError::IncidentNotFound(id.to_string()).into())
    }
}

impl Default for IncidentManager {
    fn default() -> Self {
        Self::new()
    }
}

fn component_prefix(monitor: &str) -> String {
    monitor.split('_').next().unwrap_or(monitor).to_string()
}

fn new_incident(component: String, severity: AlertSeverity, related_alerts: Vec<String>) -> Incident {
    let now = now_ms();
    Incident {
        id: format!("incident-{component}-{now}"),
        severity,
        component,
        related_alerts,
        status: IncidentStatus::Detected,
        detected_at: now,
        investigating_at: None,
        recovered_at: None,
        resolved_at: None,
        correlation_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(id: &str, monitor: &str, severity: AlertSeverity) -> Alert {
        Alert {
            id: id.to_string(),
            monitor: monitor.to_string(),
            severity,
            metric: "m".to_string(),
            value: 0.0,
            threshold: 0.0,
            message: String::new(),
            timestamp: now_ms(),
            acknowledged: false,
            escalated: false,
            escalated_to: None,
            resolved: false,
            below_warning_streak: 0,
            occurrences: 1,
            correlation_id: None,
        }
    }

    #[test]
    fn three_clustered_alerts_create_one_incident() {
        let manager = IncidentManager::new();
        let alerts = vec![
            alert("a1", "kafka_consumer_1", AlertSeverity::High),
            alert("a2", "kafka_consumer_2", AlertSeverity::High),
            alert("a3", "kafka_consumer_3", AlertSeverity::High),
        ];
        let created = manager.detect_tick(&alerts);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].related_alerts.len(), 3);
        assert_eq!(created[0].status, IncidentStatus::Detected);
    }

    #[test]
    fn single_critical_alert_creates_incident() {
        let manager = IncidentManager::new();
        let alerts = vec![alert("a1", "disk_space", AlertSeverity::Critical)];
        let created = manager.detect_tick(&alerts);
        assert_eq!(created.len(), 1);
    }

    #[test]
    fn auto_resolves_when_all_alerts_resolved_and_old_enough() {
        let manager = IncidentManager::new();
        let mut alerts = vec![
            alert("a1", "kafka_consumer_1", AlertSeverity::High),
            alert("a2", "kafka_consumer_2", AlertSeverity::High),
            alert("a3", "kafka_consumer_3", AlertSeverity::High),
        ];
        manager.detect_tick(&alerts);
        for a in &mut alerts {
            a.resolved = true;
        }
        {
            let mut incidents = manager.incidents.write().unwrap();
            incidents[0].detected_at = now_ms() - 6 * 60 * 1000;
        }
        let resolved = manager.auto_resolve_tick(&alerts);
        assert_eq!(resolved.len(), 1);
    }
}
