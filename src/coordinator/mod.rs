//! Coordinator (C8)
//!
//! Owns process lifecycle: restores snapshots, brings up every other
//! component, runs the internal event hub, and supervises the periodic
//! loops with a `tokio::task::JoinSet` and a `CancellationToken` threaded
//! through every spawned task.

mod handlers;
mod loops;
mod registry;

pub use registry::{ComponentRegistry, ComponentState, ComponentStatus};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::bus::BusAdapter;
use crate::config::CladcConfig;
use crate::error::Result;
use crate::experience::ExperienceBuffer;
use crate::improvement::{self, ImprovementPipeline};
use crate::monitoring::{recovery, MonitoringSystem, SystemMetricsSource};
use crate::persistence::SnapshotStore;
use crate::registry::ModelRegistry;
use crate::reporting::{GenerateOptions, ReportingSystem};
use crate::store::EventStore;
use crate::types::{
    AngelInsight, Capability, Incident, Issue, IssueSeverity, LearningEvent, Model, Priority,
    Report,
};

mod snapshots {
    pub const EVENTS: &str = "angels_learning.json";
    pub const INSIGHTS: &str = "angels_insights.json";
    pub const MODELS: &str = "model_registry.json";
    pub const ALERTS: &str = "alerts_history.json";
    pub const INCIDENTS: &str = "incidents_history.json";
    pub const REPORTS: &str = "reports_history.json";
    pub const DOCUMENTATION: &str = "documentation.json";
}

/// Fixed set of bus channels the coordinator subscribes to at startup.
const CONSUME_CHANNELS: &[&str] = &[
    "omni.learning.events",
    "omni.rl.experiences",
    "omni.rl.rewards",
    "omni.rl.learning",
    "omni.rl.inference",
];

pub struct Coordinator {
    pub config: Arc<CladcConfig>,
    pub bus: Arc<BusAdapter>,
    pub events: Arc<EventStore>,
    pub experiences: Arc<ExperienceBuffer>,
    pub registry: Arc<ModelRegistry>,
    pub pipeline: Arc<ImprovementPipeline>,
    pub monitoring: Arc<MonitoringSystem>,
    pub reporting: Arc<ReportingSystem>,
    pub persistence: Arc<SnapshotStore>,
    pub capability: Arc<dyn Capability>,
    pub components: ComponentRegistry,
    system_metrics: SystemMetricsSource,
}

impl Coordinator {
    /// Step 1 of startup: restore every snapshot and construct each
    /// component from the restored state, falling back to empty state
    /// per component when nothing was persisted.
    pub fn new(config: Arc<CladcConfig>, capability: Arc<dyn Capability>) -> Arc<Self> {
        let persistence = Arc::new(SnapshotStore::new(config.data_dir.clone()));
        if let Err(e) = persistence.ensure_dirs(&[
            config.reports_dir.as_str(),
            config.docs_dir.as_str(),
            config.logs_dir.as_str(),
            config.generated_dir.as_str(),
        ]) {
            tracing::warn!(error = %e, "failed to create data directories");
        }

        let restored_events: Vec<LearningEvent> = persistence.read(snapshots::EVENTS).unwrap_or_default();
        let restored_insights: Vec<AngelInsight> = persistence.read(snapshots::INSIGHTS).unwrap_or_default();
        let events = Arc::new(EventStore::restore(config.max_events, restored_events, restored_insights));

        let registry = Arc::new(ModelRegistry::new(
            config.max_model_versions,
            config.max_backups,
            config.max_performance_samples,
        ));
        let restored_models: HashMap<String, Model> = persistence.read(snapshots::MODELS).unwrap_or_default();
        registry.restore(restored_models);

        let restored_alerts = persistence.read(snapshots::ALERTS).unwrap_or_default();
        let restored_incidents = persistence.read(snapshots::INCIDENTS).unwrap_or_default();
        let monitoring = Arc::new(MonitoringSystem::restore(
            restored_alerts,
            restored_incidents,
            config.alert_thresholds,
            config.escalation_rules.clone(),
            config.max_metric_samples,
        ));

        let restored_reports: Vec<Report> = persistence.read(snapshots::REPORTS).unwrap_or_default();
        let restored_docs: HashMap<String, Report> = persistence.read(snapshots::DOCUMENTATION).unwrap_or_default();
        let reporting = Arc::new(ReportingSystem::restore(restored_reports, restored_docs, config.max_report_history));

        let bus = Arc::new(BusAdapter::new(config.bus_reconnect_min_backoff_ms, config.bus_reconnect_max_backoff_ms));
        let experiences = Arc::new(ExperienceBuffer::new(config.max_buffer_size, config.batch_size));
        let pipeline = Arc::new(ImprovementPipeline::new(
            registry.clone(),
            events.clone(),
            capability.clone(),
            bus.clone(),
            config.max_concurrent_tasks,
            config.validation_threshold,
            config.rigorous_validation_threshold,
            config.stability_variance_threshold,
            config.backup_before_update,
        ));

        let components = ComponentRegistry::new();
        for name in ["bus", "event_store", "experience_buffer", "model_registry", "improvement_pipeline", "monitoring", "reporting", "persistence"] {
            components.set(name, ComponentState::Starting);
        }

        Arc::new(Self {
            config,
            bus,
            events,
            experiences,
            registry,
            pipeline,
            monitoring,
            reporting,
            persistence,
            capability,
            components,
            system_metrics: SystemMetricsSource::new(2 * 1024 * 1024 * 1024),
        })
    }

    /// Steps 2-4 of startup plus the supervised run loop. Returns once
    /// every spawned task has exited, which only happens after
    /// `cancel` fires and the shutdown grace elapses.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<()> {
        for &channel in CONSUME_CHANNELS {
            self.components.set(channel, ComponentState::Starting);
        }
        for name in ["bus", "event_store", "experience_buffer", "model_registry", "improvement_pipeline", "monitoring", "reporting", "persistence"] {
            self.components.set(name, ComponentState::Running);
        }

        let mut tasks: JoinSet<&'static str> = JoinSet::new();

        for &channel in CONSUME_CHANNELS {
            let coordinator = self.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                coordinator.subscription_task(channel, cancel).await;
                channel
            });
        }

        macro_rules! spawn_loop {
            ($name:literal, $f:path) => {{
                let coordinator = self.clone();
                let cancel = cancel.clone();
                tasks.spawn(async move {
                    $f(coordinator, cancel).await;
                    $name
                });
            }};
        }

        spawn_loop!("experience_flush", loops::experience_flush_loop);
        spawn_loop!("improvement_sweep", loops::improvement_sweep_loop);
        spawn_loop!("retraining_sweep", loops::retraining_loop);
        spawn_loop!("ab_test_tick", loops::ab_test_loop);
        spawn_loop!("improvement_drain", loops::drain_pending_loop);
        spawn_loop!("monitoring_tick", loops::monitoring_tick_loop);
        spawn_loop!("health_check", loops::health_check_loop);
        spawn_loop!("report_schedule", loops::report_schedule_loop);
        spawn_loop!("documentation_refresh", loops::documentation_refresh_loop);
        spawn_loop!("persistence_snapshot", loops::persistence_loop);
        spawn_loop!("retention_cleanup", loops::cleanup_loop);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("coordinator: shutdown signal received, waiting up to 5s for tasks");
                    break;
                }
                result = tasks.join_next() => {
                    match result {
                        Some(Ok(name)) => tracing::debug!(task = name, "coordinator task exited"),
                        Some(Err(e)) => tracing::error!(error = %e, "coordinator task panicked"),
                        None => {
                            tracing::info!("coordinator: all tasks exited");
                            return Ok(());
                        }
                    }
                }
            }
        }

        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        let drain = async {
            while tasks.join_next().await.is_some() {}
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            tracing::warn!("coordinator: shutdown grace period elapsed with tasks still running");
            tasks.abort_all();
        }
        self.snapshot_all();
        Ok(())
    }

    async fn subscription_task(&self, channel: &'static str, cancel: CancellationToken) {
        let mut rx = match self.bus.subscribe(channel).await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::error!(channel, error = %e, "failed to subscribe, channel inactive for this run");
                self.components.set_degraded(channel, e.to_string());
                return;
            }
        };
        self.components.set(channel, ComponentState::Running);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                maybe_msg = rx.recv() => {
                    let Some(payload) = maybe_msg else { return; };
                    self.dispatch(channel, payload).await;
                }
            }
        }
    }

    async fn dispatch(&self, channel: &str, payload: serde_json::Value) {
        match channel {
            "omni.learning.events" => handlers::handle_learning_event(&self.events, payload),
            "omni.rl.experiences" => handlers::handle_experience(&self.experiences, payload),
            "omni.rl.rewards" => handlers::handle_reward(&payload),
            "omni.rl.learning" => handlers::handle_learning_request(&payload),
            "omni.rl.inference" => {
                handlers::handle_inference_request(self.capability.as_ref(), &self.bus, payload).await;
            }
            other => tracing::warn!(channel = other, "no handler registered for channel"),
        }
    }

    pub async fn run_improvement_sweep(&self) {
        let candidates = improvement::select_sweep_candidates(&self.registry.list());
        for name in candidates {
            self.pipeline
                .enqueue(
                    &name,
                    Issue {
                        kind: "scheduled_sweep".to_string(),
                        severity: IssueSeverity::Medium,
                        description: "periodic improvement sweep candidate".to_string(),
                    },
                    Priority::Medium,
                    false,
                )
                .await;
        }
    }

    pub async fn run_retraining_sweep(&self) {
        let candidates = improvement::select_retraining_candidates(&self.registry.list());
        for name in candidates {
            self.pipeline
                .enqueue(
                    &name,
                    Issue {
                        kind: "retraining".to_string(),
                        severity: IssueSeverity::High,
                        description: "stale or degraded model selected for rigorous retraining".to_string(),
                    },
                    Priority::High,
                    true,
                )
                .await;
        }
    }

    pub fn run_ab_test_tick(&self) {
        if !self.config.enable_ab_testing {
            return;
        }
        for model in self.registry.list() {
            let Some(test) = improvement::enroll(&model) else {
                continue;
            };
            let outcome = improvement::select_winner(&test, self.config.performance_threshold);
            tracing::info!(
                model = %model.name,
                winner = ?outcome.winner,
                improvement = outcome.improvement,
                "a/b test evaluated"
            );
        }
    }

    pub async fn run_monitoring_tick(&self) {
        if let Err(e) = self.monitoring.observe_system(&self.system_metrics) {
            tracing::warn!(error = %e, "system metrics observation failed");
        }
        let (escalated, created, auto_resolved) = self.monitoring.management_tick();
        for id in &escalated {
            tracing::info!(alert_id = id, "alert escalated");
        }
        for incident in &created {
            tracing::warn!(incident_id = %incident.id, component = %incident.component, "incident detected");
            if self.config.auto_recovery {
                self.attempt_recovery(incident).await;
            }
        }
        for id in &auto_resolved {
            tracing::info!(incident_id = id, "incident auto-resolved");
        }
        self.publish_metrics_snapshot().await;
    }

    /// Drives an incident from `detected` through auto-recovery: marks
    /// it `investigating`, runs the component-specific procedure, and
    /// on success acknowledges every related alert and marks the
    /// incident `recovered` (scenario 6).
    async fn attempt_recovery(&self, incident: &Incident) {
        if let Err(e) = self.monitoring.incidents.mark_investigating(&incident.id) {
            tracing::warn!(error = %e, incident_id = %incident.id, "failed to mark incident investigating");
        }

        let procedure = recovery::procedure_for(&incident.component);
        let condition_cleared = match procedure {
            recovery::Procedure::BusReconnect => {
                let health = self.bus.health().await;
                health.kafka_connected && health.amqp_connected
            }
            recovery::Procedure::RlFlushRequeue => {
                let _ = self.experiences.flush_all(self.capability.as_ref()).await;
                self.experiences.total_buffered() < self.config.max_buffer_size
            }
            recovery::Procedure::WorkerPoolRestart | recovery::Procedure::Unknown => false,
        };
        let outcome = recovery::outcome_for(procedure, condition_cleared);
        tracing::info!(incident_id = %incident.id, component = %incident.component, ?procedure, ?outcome, "auto-recovery attempted");

        if outcome == recovery::RecoveryOutcome::Recovered {
            self.monitoring.alerts.acknowledge_many(&incident.related_alerts);
            if let Err(e) = self.monitoring.incidents.mark_recovered(&incident.id) {
                tracing::warn!(error = %e, incident_id = %incident.id, "failed to mark incident recovered");
            }
        }
    }

    /// Periodic `omni.performance.metrics` snapshot (§6): the latest
    /// system measurements plus the current alert/incident counts.
    async fn publish_metrics_snapshot(&self) {
        let open_incidents = self
            .monitoring
            .incidents
            .all()
            .iter()
            .filter(|i| i.status != crate::types::IncidentStatus::Resolved)
            .count();
        let snapshot = serde_json::json!({
            "cpu_usage": self.monitoring.metrics.latest("cpu_usage"),
            "memory_usage": self.monitoring.metrics.latest("memory_usage"),
            "active_alerts": self.monitoring.alerts.active().len(),
            "open_incidents": open_incidents,
            "timestamp": crate::types::now_ms(),
        });
        if let Err(e) = self.bus.publish("omni.performance.metrics", snapshot).await {
            tracing::warn!(error = %e, "failed to publish performance metrics snapshot");
        }
    }

    pub async fn run_health_check(&self) {
        let health = self.bus.health().await;
        if !health.kafka_connected || !health.amqp_connected {
            self.components.set_degraded("bus", health.last_error.clone().unwrap_or_default());
        } else {
            self.components.set("bus", ComponentState::Running);
        }
    }

    pub async fn run_report_schedule(&self) {
        let now = chrono::Local::now();
        let due = self.reporting.due_schedule(now);
        for report_type in due {
            match self.reporting.generate(report_type, &GenerateOptions::default(), &self.events, &self.registry, &self.monitoring) {
                Ok(report) => {
                    tracing::info!(report_id = %report.id, ?report_type, "scheduled report generated");
                    self.publish_report_published(&report).await;
                }
                Err(e) => tracing::warn!(error = %e, ?report_type, "scheduled report generation failed"),
            }
        }
    }

    /// `report_published` via C1, required of both the scheduled path
    /// above and the on-demand `generate_report` Control API operation
    /// (§4.7).
    pub async fn publish_report_published(&self, report: &Report) {
        let payload = serde_json::json!({
            "type": "report_published",
            "report_id": report.id,
            "report_type": report.r#type,
            "title": report.title,
            "generated_at": report.metadata.generated_at,
        });
        if let Err(e) = self.bus.publish("omni.workflows", payload).await {
            tracing::warn!(error = %e, report_id = %report.id, "failed to publish report_published event");
        }
    }

    pub fn run_cleanup(&self) {
        let removed_reports = self.reporting.cleanup(self.config.retention_period_reports_secs);
        if removed_reports > 0 {
            tracing::debug!(removed_reports, "report retention cleanup");
        }
    }

    pub fn snapshot_all(&self) {
        if let Err(e) = self.persistence.write(snapshots::EVENTS, &self.events.snapshot_events()) {
            tracing::warn!(error = %e, "failed to snapshot events");
        }
        if let Err(e) = self.persistence.write(snapshots::INSIGHTS, &self.events.insights()) {
            tracing::warn!(error = %e, "failed to snapshot insights");
        }
        if let Err(e) = self.persistence.write(snapshots::MODELS, &self.registry.snapshot()) {
            tracing::warn!(error = %e, "failed to snapshot model registry");
        }
        if let Err(e) = self.persistence.write(snapshots::ALERTS, &self.monitoring.snapshot_alerts()) {
            tracing::warn!(error = %e, "failed to snapshot alerts");
        }
        if let Err(e) = self.persistence.write(snapshots::INCIDENTS, &self.monitoring.snapshot_incidents()) {
            tracing::warn!(error = %e, "failed to snapshot incidents");
        }
        if let Err(e) = self.persistence.write(snapshots::REPORTS, &self.reporting.snapshot_reports()) {
            tracing::warn!(error = %e, "failed to snapshot reports");
        }
        if let Err(e) = self.persistence.write(snapshots::DOCUMENTATION, &self.reporting.snapshot_documentation()) {
            tracing::warn!(error = %e, "failed to snapshot documentation");
        }
    }
}
