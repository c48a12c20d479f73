use axum::routing::{get, post};
use axum::Router;

use super::{handlers, ApiState};

pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(handlers::status))
        .route("/events", get(handlers::list_events).post(handlers::publish_learning_event))
        .route("/daily_summary", get(handlers::daily_summary))
        .route("/insights", get(handlers::insights))
        .route("/patterns", get(handlers::patterns))
        .route("/models", get(handlers::list_models))
        .route("/models/:name/versions", get(handlers::model_versions))
        .route("/improvement/tasks", get(handlers::improvement_tasks))
        .route("/improvement/trigger/:name", post(handlers::trigger_improvement))
        .route("/improvement/rollback/:name", post(handlers::trigger_rollback))
        .route("/alerts", get(handlers::list_alerts))
        .route("/alerts/:id/acknowledge", post(handlers::acknowledge_alert))
        .route("/incidents", get(handlers::list_incidents))
        .route("/incidents/:id/resolve", post(handlers::resolve_incident))
        .route("/health_check", post(handlers::trigger_health_check))
        .route("/reports", get(handlers::list_reports))
        .route("/reports/generate", post(handlers::generate_report))
        .route("/documentation", get(handlers::list_documentation))
        .route("/experiences", post(handlers::publish_experience))
        .route("/buffers/flush", post(handlers::flush_buffers))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use async_trait::async_trait;

    use super::*;
    use crate::config::CladcConfig;
    use crate::coordinator::Coordinator;
    use crate::error::Result;
    use crate::types::{Capability, CollectDataOutcome, InferOutcome, SmokeTestOutcome, TrainOutcome};

    struct NoopCapability;

    #[async_trait]
    impl Capability for NoopCapability {
        async fn train(&self, _algorithm: &str, _params: serde_json::Value) -> Result<TrainOutcome> {
            Ok(TrainOutcome { performance: 0.8, iterations: 1, converged: true, training_time_ms: 1 })
        }
        async fn infer(&self, _algorithm: &str, _state: serde_json::Value) -> Result<InferOutcome> {
            Ok(InferOutcome { action: serde_json::json!({}), confidence: None })
        }
        async fn collect_data(&self, _algorithms: &[String]) -> Result<CollectDataOutcome> {
            Ok(CollectDataOutcome { records: 0, dataset: serde_json::json!({}) })
        }
        async fn smoke_test(&self, _algorithm: &str, _version: &str) -> Result<SmokeTestOutcome> {
            Ok(SmokeTestOutcome { passed: 50, total: 50 })
        }
    }

    async fn test_state() -> ApiState {
        let config = Arc::new(CladcConfig::default());
        let capability: Arc<dyn Capability> = Arc::new(NoopCapability);
        let coordinator = Coordinator::new(config, capability);
        ApiState::new(coordinator)
    }

    #[tokio::test]
    async fn status_route_returns_ok() {
        let app = api_routes(test_state().await);
        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn model_versions_for_unknown_model_is_not_found() {
        let app = api_routes(test_state().await);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/models/nonexistent/versions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
