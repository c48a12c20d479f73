//! Built-in `Capability` implementation.
//!
//! The core depends only on the `Capability` seam and never implements
//! real training or inference itself — a production deployment is
//! expected to supply its own implementation backed by an actual model
//! server. This one generates plausible synthetic outcomes so the
//! binary runs standalone without an external ML service wired in.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::error::Result;
use crate::types::{Capability, CollectDataOutcome, InferOutcome, SmokeTestOutcome, TrainOutcome};

#[derive(Debug, Default)]
pub struct SyntheticCapability;

#[async_trait]
impl Capability for SyntheticCapability {
    async fn train(&self, _model_name: &str, dataset: serde_json::Value) -> Result<TrainOutcome> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let records = dataset.get("records").and_then(serde_json::Value::as_u64).unwrap_or(0);
        let mut rng = rand::thread_rng();
        let performance = rng.gen_range(0.6..0.95);
        Ok(TrainOutcome {
            performance,
            iterations: (records / 10).max(1) as u32,
            converged: performance > 0.7,
            training_time_ms: 50,
        })
    }

    async fn infer(&self, _algorithm: &str, state: serde_json::Value) -> Result<InferOutcome> {
        let mut rng = rand::thread_rng();
        Ok(InferOutcome {
            action: serde_json::json!({ "observed_state": state, "chosen": rng.gen_range(0..4) }),
            confidence: Some(rng.gen_range(0.5..0.99)),
        })
    }

    async fn collect_data(&self, components: &[String]) -> Result<CollectDataOutcome> {
        let mut rng = rand::thread_rng();
        let records = components.len() * rng.gen_range(50..200);
        Ok(CollectDataOutcome {
            records,
            dataset: serde_json::json!({ "records": records, "components": components }),
        })
    }

    async fn smoke_test(&self, _model_name: &str, _version: &str) -> Result<SmokeTestOutcome> {
        let mut rng = rand::thread_rng();
        let total = 50;
        let passed = rng.gen_range((total * 7 / 10)..=total);
        Ok(SmokeTestOutcome { passed, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn train_reports_convergence_consistent_with_performance() {
        let capability = SyntheticCapability;
        let outcome = capability.train("demo", serde_json::json!({"records": 500})).await.unwrap();
        assert_eq!(outcome.converged, outcome.performance > 0.7);
    }

    #[tokio::test]
    async fn smoke_test_never_exceeds_total() {
        let capability = SyntheticCapability;
        let outcome = capability.smoke_test("demo", "1.0.0").await.unwrap();
        assert!(outcome.passed <= outcome.total);
    }
}
