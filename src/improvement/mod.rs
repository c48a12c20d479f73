//! Improvement Pipeline (C5)
//!
//! A task orchestrator running the six-step model improvement state
//! machine (`analyze → collect_data → train → validate → test_deploy →
//! deploy`), a scheduled sweep, a stricter retraining path, and an A/B
//! test ledger. Concurrency is bounded to `maxConcurrentTasks`; excess
//! tasks queue FIFO.

mod abtest;
mod pipeline;
mod scheduler;

pub use abtest::{enroll, select_winner, AbTest, AbTestOutcome, AbTestWinner};
pub use pipeline::{publish_model_update, run_task};
pub use scheduler::{select_retraining_candidates, select_sweep_candidates};

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};

use crate::bus::BusAdapter;
use crate::error::{PipelineError, Result};
use crate::registry::ModelRegistry;
use crate::store::EventStore;
use crate::types::{
    now_ms, Capability, ImprovementTask, Issue, IssueSeverity, Priority, StepTracker, TaskStatus,
};

pub struct ImprovementPipeline {
    registry: Arc<ModelRegistry>,
    events: Arc<EventStore>,
    capability: Arc<dyn Capability>,
    bus: Arc<BusAdapter>,
    tasks: Mutex<Vec<ImprovementTask>>,
    pending_queue: Mutex<VecDeque<String>>,
    concurrency: Arc<Semaphore>,
    max_concurrent: usize,
    validation_threshold: f64,
    rigorous_validation_threshold: f64,
    stability_variance_threshold: f64,
    backup_before_update: bool,
}

impl ImprovementPipeline {
    pub fn new(
        registry: Arc<ModelRegistry>,
        events: Arc<EventStore>,
        capability: Arc<dyn Capability>,
        bus: Arc<BusAdapter>,
        max_concurrent: usize,
        validation_threshold: f64,
        rigorous_validation_threshold: f64,
        stability_variance_threshold: f64,
        backup_before_update: bool,
    ) -> Self {
        Self {
            registry,
            events,
            capability,
            bus,
            tasks: Mutex::new(Vec::new()),
            pending_queue: Mutex::new(VecDeque::new()),
            concurrency: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            validation_threshold,
            rigorous_validation_threshold,
            stability_variance_threshold,
            backup_before_update,
        }
    }

    pub async fn enqueue(
        &self,
        model_name: &str,
        issue: Issue,
        priority: Priority,
        rigorous: bool,
    ) -> String {
        let id = format!("task-{}-{}", model_name, now_ms());
        let task = ImprovementTask {
            id: id.clone(),
            model_name: model_name.to_string(),
            issue,
            priority,
            status: TaskStatus::Pending,
            steps: StepTracker::default(),
            created_at: now_ms(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            analysis: None,
            training_result: None,
            validation: None,
            deployment_test: None,
            deployment: None,
            rigorous,
        };
        self.tasks.lock().await.push(task.clone());
        self.pending_queue.lock().await.push_back(id.clone());
        publish_task_event(&self.bus, "task_created", &task).await;
        id
    }

    /// Triggered manually from C10. Enqueues a `high` priority task for
    /// `model_name` with a manual-request issue tag.
    pub async fn trigger_improvement(&self, model_name: &str) -> Result<String> {
        self.registry.lookup(model_name)?;
        Ok(self
            .enqueue(
                model_name,
                Issue {
                    kind: "manual_request".to_string(),
                    severity: IssueSeverity::Medium,
                    description: "manual trigger via control API".to_string(),
                },
                Priority::High,
                false,
            )
            .await)
    }

    /// Drains up to `maxConcurrentTasks` pending tasks and runs them
    /// concurrently; each acquires one permit from the bounded pool.
    pub async fn drain_pending(&self) -> Vec<Result<()>> {
        let mut ids = Vec::new();
        {
            let mut queue = self.pending_queue.lock().await;
            while ids.len() < self.max_concurrent {
                match queue.pop_front() {
                    Some(id) => ids.push(id),
                    None => break,
                }
            }
        }

        let mut handles = Vec::new();
        for id in ids {
            let permit = self.concurrency.clone().acquire_owned().await.expect("semaphore closed");
            let registry = self.registry.clone();
            let events = self.events.clone();
            let capability = self.capability.clone();
            let validation_threshold = self.validation_threshold;
            let stability_variance_threshold = self.stability_variance_threshold;
            let backup_before_update = self.backup_before_update;

            let task_snapshot = {
                let tasks = self.tasks.lock().await;
                tasks.iter().find(|t| t.id == id).cloned()
            };

            let Some(mut task) = task_snapshot else {
                continue;
            };
            let threshold = if task.rigorous {
                self.rigorous_validation_threshold
            } else {
                validation_threshold
            };

            let tasks_handle = &self.tasks;
            let outcome = pipeline::run_task(
                &mut task,
                registry.as_ref(),
                events.as_ref(),
                capability.as_ref(),
                self.bus.as_ref(),
                threshold,
                stability_variance_threshold,
                backup_before_update,
            )
            .await;
            {
                let mut tasks = tasks_handle.lock().await;
                if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
                    *slot = task.clone();
                }
            }
            match task.status {
                TaskStatus::Completed => publish_task_event(&self.bus, "task_completed", &task).await,
                TaskStatus::Failed => publish_task_event(&self.bus, "task_failed", &task).await,
                TaskStatus::Pending | TaskStatus::InProgress => {}
            }
            drop(permit);
            handles.push(outcome);
        }
        handles
    }

    pub async fn tasks(&self) -> Vec<ImprovementTask> {
        self.tasks.lock().await.clone()
    }

    pub async fn task(&self, id: &str) -> Result<ImprovementTask> {
        self.tasks
            .lock()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| PipelineError::TaskNotFound(id.to_string()).into())
    }

    pub async fn restore(&self, tasks: Vec<ImprovementTask>) {
        let mut pending = self.pending_queue.lock().await;
        for task in &tasks {
            if task.status == TaskStatus::Pending {
                pending.push_back(task.id.clone());
            }
        }
        *self.tasks.lock().await = tasks;
    }
}

/// Emits one of the "report/task lifecycle events" §6 requires on
/// `omni.workflows`. A publish failure is logged, not propagated — the
/// task's own state machine has already committed by the time this
/// runs.
async fn publish_task_event(bus: &BusAdapter, event: &'static str, task: &ImprovementTask) {
    let payload = serde_json::json!({
        "type": event,
        "task_id": task.id,
        "model_name": task.model_name,
        "status": task.status,
        "priority": task.priority,
    });
    if let Err(e) = bus.publish("omni.workflows", payload).await {
        tracing::warn!(error = %e, task_id = %task.id, event, "failed to publish task lifecycle event");
    }
}
