use serde::{Deserialize, Serialize};

use super::Timestamp;

/// One reinforcement-learning tuple belonging to a single algorithm
/// stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub algorithm: String,
    pub state: serde_json::Value,
    pub action: serde_json::Value,
    pub reward: f64,
    pub next_state: serde_json::Value,
    pub timestamp: Timestamp,
    pub processed: bool,
}

impl Experience {
    pub fn new(
        algorithm: impl Into<String>,
        state: serde_json::Value,
        action: serde_json::Value,
        reward: f64,
        next_state: serde_json::Value,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            state,
            action,
            reward,
            next_state,
            timestamp,
            processed: false,
        }
    }
}
