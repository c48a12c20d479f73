use serde::{Deserialize, Serialize};

use super::{Correlated, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Escalation timeout per severity, per §4.6: critical 5m, high 15m,
    /// medium 30m. Low never auto-escalates.
    pub const fn escalation_timeout_secs(self) -> Option<u64> {
        match self {
            Self::Critical => Some(5 * 60),
            Self::High => Some(15 * 60),
            Self::Medium => Some(30 * 60),
            Self::Low => None,
        }
    }

    pub const fn escalation_target(self) -> Option<&'static str> {
        match self {
            Self::Critical => Some("admin"),
            Self::High => Some("team"),
            Self::Medium => Some("monitoring"),
            Self::Low => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub monitor: String,
    pub severity: AlertSeverity,
    pub metric: String,
    pub value: f64,
    pub threshold: f64,
    pub message: String,
    pub timestamp: Timestamp,
    pub acknowledged: bool,
    pub escalated: bool,
    pub escalated_to: Option<&'static str>,
    pub resolved: bool,
    /// Consecutive below-warning measurements observed so far; resolves
    /// once this reaches 2.
    pub below_warning_streak: u32,
    /// Count of de-duplicated re-triggers for the same `(monitor, metric)`.
    pub occurrences: u32,
    pub correlation_id: Option<String>,
}

impl Correlated for Alert {
    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

impl Alert {
    pub fn is_terminal(&self) -> bool {
        self.resolved
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Detected,
    Investigating,
    Recovered,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub severity: AlertSeverity,
    pub component: String,
    pub related_alerts: Vec<String>,
    pub status: IncidentStatus,
    pub detected_at: Timestamp,
    pub investigating_at: Option<Timestamp>,
    pub recovered_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub correlation_id: Option<String>,
}

impl Correlated for Incident {
    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorType {
    System,
    Component,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    pub name: String,
    pub r#type: MonitorType,
    pub component: Option<String>,
    pub interval_secs: u64,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub enabled: bool,
}
