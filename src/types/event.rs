use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Correlated, Timestamp};

/// A single occurrence reported by a producer ("angel"). Immutable once
/// appended to the event store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEvent {
    pub id: String,
    pub angel: String,
    pub domain: String,
    pub input: serde_json::Value,
    pub output: EventOutcome,
    pub metrics: HashMap<String, f64>,
    pub timestamp: Timestamp,
    pub correlation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOutcome {
    pub payload: serde_json::Value,
    pub success: Option<bool>,
}

impl Correlated for LearningEvent {
    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

/// A classification attached to zero or more events sharing a pattern
/// key, produced by `pattern_analysis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    EmergingPattern,
    DecliningPattern,
    StablePattern,
    Anomaly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AngelInsight {
    pub r#type: InsightType,
    pub pattern_key: String,
    pub significance: f64,
    pub timestamp: Timestamp,
    /// Event ids this insight is attached to.
    pub event_ids: Vec<String>,
}
