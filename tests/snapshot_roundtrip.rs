//! Snapshot round-trip integration test.
//!
//! Builds a coordinator, pushes state into every snapshot-backed
//! component (event store, model registry, monitoring, reporting),
//! writes a full snapshot via `Coordinator::snapshot_all`, then boots a
//! fresh coordinator against the same data directory and asserts the
//! restored state matches.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use cladc::config::CladcConfig;
use cladc::coordinator::Coordinator;
use cladc::error::Result;
use cladc::types::{
    Capability, CollectDataOutcome, EventOutcome, InferOutcome, LearningEvent, SmokeTestOutcome,
    TrainOutcome,
};

struct NoopCapability;

#[async_trait]
impl Capability for NoopCapability {
    async fn train(&self, _algorithm: &str, _params: serde_json::Value) -> Result<TrainOutcome> {
        Ok(TrainOutcome {
            performance: 0.8,
            iterations: 1,
            converged: true,
            training_time_ms: 1,
        })
    }
    async fn infer(&self, _algorithm: &str, _state: serde_json::Value) -> Result<InferOutcome> {
        Ok(InferOutcome {
            action: serde_json::json!({}),
            confidence: None,
        })
    }
    async fn collect_data(&self, _algorithms: &[String]) -> Result<CollectDataOutcome> {
        Ok(CollectDataOutcome {
            records: 0,
            dataset: serde_json::json!({}),
        })
    }
    async fn smoke_test(&self, _algorithm: &str, _version: &str) -> Result<SmokeTestOutcome> {
        Ok(SmokeTestOutcome { passed: 50, total: 50 })
    }
}

fn config_for(dir: &TempDir) -> CladcConfig {
    let mut config = CladcConfig::default();
    config.data_dir = dir.path().join("data").display().to_string();
    config.reports_dir = dir.path().join("reports").display().to_string();
    config.docs_dir = dir.path().join("docs").display().to_string();
    config.logs_dir = dir.path().join("logs").display().to_string();
    config.generated_dir = dir.path().join("generated").display().to_string();
    config
}

fn capability() -> Arc<dyn Capability> {
    Arc::new(NoopCapability)
}

#[tokio::test]
async fn event_store_and_model_registry_survive_a_restart() {
    let dir = TempDir::new().unwrap();

    let coordinator = Coordinator::new(Arc::new(config_for(&dir)), capability());
    coordinator
        .events
        .append(LearningEvent {
            id: String::new(),
            angel: "LearningAngel".to_string(),
            domain: "traffic".to_string(),
            input: serde_json::json!({}),
            output: EventOutcome {
                payload: serde_json::json!({}),
                success: Some(true),
            },
            metrics: HashMap::new(),
            timestamp: cladc::types::now_ms(),
            correlation_id: None,
        })
        .unwrap();
    coordinator
        .registry
        .register(cladc::registry::ModelSpec {
            name: "angel_learning_model".to_string(),
            r#type: cladc::types::ModelType::ReinforcementLearning,
            components: vec![],
        })
        .unwrap();
    coordinator
        .registry
        .deploy("angel_learning_model", 0.82, HashMap::new(), true)
        .unwrap();

    coordinator.snapshot_all();

    let restarted = Coordinator::new(Arc::new(config_for(&dir)), capability());

    assert_eq!(restarted.events.len(), 1);
    let summary = restarted.events.daily_summary(None, None);
    assert_eq!(summary.count, 1);

    let model = restarted.registry.lookup("angel_learning_model").unwrap();
    assert_eq!(model.version, cladc::types::Version::new(1, 0, 1));
    assert!((model.current_performance - 0.82).abs() < 1e-9);
}

#[tokio::test]
async fn monitoring_and_reporting_state_survive_a_restart() {
    let dir = TempDir::new().unwrap();

    let coordinator = Coordinator::new(Arc::new(config_for(&dir)), capability());
    let alert_id = coordinator.monitoring.observe("cpu_usage", 92.0).unwrap().unwrap();
    let report = coordinator
        .reporting
        .generate(
            cladc::types::ReportType::DailySummary,
            &cladc::reporting::GenerateOptions::default(),
            &coordinator.events,
            &coordinator.registry,
            &coordinator.monitoring,
        )
        .unwrap();

    coordinator.snapshot_all();

    let restarted = Coordinator::new(Arc::new(config_for(&dir)), capability());

    assert_eq!(restarted.monitoring.alerts.active().len(), 1);
    assert_eq!(restarted.monitoring.alerts.get(&alert_id).unwrap().id, alert_id);
    assert_eq!(restarted.reporting.reports().len(), 1);
    assert_eq!(restarted.reporting.report(&report.id).unwrap().id, report.id);
}

#[tokio::test]
async fn missing_snapshot_directory_falls_back_to_empty_state() {
    let dir = TempDir::new().unwrap();
    // No snapshot has ever been written under this directory.
    let coordinator = Coordinator::new(Arc::new(config_for(&dir)), capability());
    assert_eq!(coordinator.events.len(), 0);
    assert!(coordinator.registry.list().is_empty());
    assert!(coordinator.monitoring.alerts.active().is_empty());
}
