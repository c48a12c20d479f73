use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque, externally-provided ML functionality. The core never
/// implements concrete training or inference; it depends only on this
/// seam, matching the "capability" framing in the glossary.
#[async_trait]
pub trait Capability: Send + Sync {
    async fn train(&self, model_name: &str, dataset: serde_json::Value) -> Result<TrainOutcome>;
    async fn infer(&self, algorithm: &str, state: serde_json::Value) -> Result<InferOutcome>;
    async fn collect_data(&self, components: &[String]) -> Result<CollectDataOutcome>;
    async fn smoke_test(&self, model_name: &str, version: &str) -> Result<SmokeTestOutcome>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainOutcome {
    pub performance: f64,
    pub iterations: u32,
    pub converged: bool,
    pub training_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferOutcome {
    pub action: serde_json::Value,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectDataOutcome {
    pub records: usize,
    pub dataset: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmokeTestOutcome {
    pub passed: u32,
    pub total: u32,
}

impl SmokeTestOutcome {
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.passed) / f64::from(self.total)
        }
    }

    /// Passes when at least 90% of subtests succeed, per the test_deploy
    /// step's success threshold.
    pub fn success(&self) -> bool {
        self.pass_rate() >= 0.9
    }
}
