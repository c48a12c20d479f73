//! Periodic loop bodies spawned by the coordinator. Each loop owns a
//! clone of the shared state it needs, runs on a fixed `tokio::time::interval`,
//! staggers its first tick to avoid a thundering herd at startup, and
//! exits on cancellation within the 5s shutdown grace.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::Coordinator;

/// Runs `body` every `period`, delaying the first iteration by
/// `initial_offset` so loops with equal periods don't all fire at
/// once. Exits promptly when `cancel` fires.
pub async fn run_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    initial_offset: Duration,
    cancel: CancellationToken,
    mut body: F,
) where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    tokio::select! {
        _ = cancel.cancelled() => return,
        () = tokio::time::sleep(initial_offset) => {}
    }

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(loop_name = name, "periodic loop received shutdown signal");
                return;
            }
            _ = interval.tick() => {
                body().await;
            }
        }
    }
}

pub async fn experience_flush_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    let period = Duration::from_secs(coordinator.config.flush_interval_secs);
    run_periodic("experience_flush", period, Duration::from_millis(200), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            let outcomes = coordinator
                .experiences
                .flush_all(coordinator.capability.as_ref())
                .await;
            if !outcomes.is_empty() {
                tracing::debug!(count = outcomes.len(), "experience flush completed");
            }
        }
    })
    .await;
}

pub async fn improvement_sweep_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    let period = coordinator.config.improvement_interval();
    run_periodic("improvement_sweep", period, Duration::from_millis(500), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            coordinator.run_improvement_sweep().await;
        }
    })
    .await;
}

pub async fn retraining_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    let period = coordinator.config.improvement_interval() * 2;
    run_periodic("retraining_sweep", period, Duration::from_secs(2), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            coordinator.run_retraining_sweep().await;
        }
    })
    .await;
}

pub async fn ab_test_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    let period = coordinator.config.improvement_interval() * 3;
    run_periodic("ab_test_tick", period, Duration::from_secs(3), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            coordinator.run_ab_test_tick();
        }
    })
    .await;
}

pub async fn drain_pending_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    // Drains whatever the sweep/retraining/manual-trigger loops enqueued;
    // runs tighter than the sweep intervals so a triggered task starts
    // promptly instead of waiting for the next sweep.
    let period = Duration::from_secs(5);
    run_periodic("improvement_drain", period, Duration::from_millis(100), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            let outcomes = coordinator.pipeline.drain_pending().await;
            for outcome in outcomes {
                if let Err(e) = outcome {
                    tracing::warn!(error = %e, "improvement task failed");
                }
            }
        }
    })
    .await;
}

pub async fn monitoring_tick_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    let period = coordinator.config.monitoring_interval();
    run_periodic("monitoring_tick", period, Duration::from_millis(300), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            coordinator.run_monitoring_tick().await;
        }
    })
    .await;
}

pub async fn health_check_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    let period = Duration::from_secs(coordinator.config.health_check_interval_secs);
    run_periodic("health_check", period, Duration::from_secs(1), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            coordinator.run_health_check().await;
        }
    })
    .await;
}

pub async fn report_schedule_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    let period = Duration::from_secs(coordinator.config.report_generation_interval_secs);
    run_periodic("report_schedule", period, Duration::from_secs(4), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            coordinator.run_report_schedule().await;
        }
    })
    .await;
}

pub async fn documentation_refresh_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    let period = Duration::from_secs(coordinator.config.documentation_update_interval_secs);
    run_periodic("documentation_refresh", period, Duration::from_secs(5), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            if let Err(e) = coordinator.reporting.refresh_documentation(&coordinator.registry, &coordinator.monitoring) {
                tracing::warn!(error = %e, "documentation refresh failed");
            }
        }
    })
    .await;
}

pub async fn persistence_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    // No dedicated interval is listed for snapshotting beyond "periodic";
    // tying it to the monitoring interval keeps disk writes frequent
    // enough to survive a crash without becoming a hot loop.
    let period = coordinator.config.monitoring_interval();
    run_periodic("persistence_snapshot", period, Duration::from_secs(6), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            coordinator.snapshot_all();
        }
    })
    .await;
}

pub async fn cleanup_loop(coordinator: Arc<Coordinator>, cancel: CancellationToken) {
    let period = Duration::from_secs(coordinator.config.retention_period_events_secs.min(3600).max(60));
    run_periodic("retention_cleanup", period, Duration::from_secs(7), cancel, || {
        let coordinator = coordinator.clone();
        async move {
            coordinator.run_cleanup();
        }
    })
    .await;
}
