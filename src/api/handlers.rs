//! Route handlers, one per Control API operation (§4.10). Every
//! fallible operation returns `Result<Json<T>, ApiError>` so a
//! component error converts straight into the uniform error envelope
//! via `ApiError::from`.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::store::{EventQuery, Period};
use crate::types::{
    Alert, DeploymentRecord, Experience, ImprovementTask, Incident, LearningEvent, Model, Report,
};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    pub components: std::collections::HashMap<String, crate::coordinator::ComponentStatus>,
    pub event_count: usize,
    pub model_count: usize,
    pub active_alert_count: usize,
    pub open_incident_count: usize,
}

pub async fn status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let coordinator = &state.coordinator;
    Json(StatusResponse {
        uptime_secs: coordinator.components.uptime_secs(),
        components: coordinator.components.snapshot(),
        event_count: coordinator.events.len(),
        model_count: coordinator.registry.list().len(),
        active_alert_count: coordinator.monitoring.alerts.active().len(),
        open_incident_count: coordinator
            .monitoring
            .incidents
            .all()
            .iter()
            .filter(|i| i.status != crate::types::IncidentStatus::Resolved)
            .count(),
    })
}

#[derive(Debug, Deserialize)]
pub struct EventsParams {
    pub angel: Option<String>,
    pub domain: Option<String>,
    pub since: Option<i64>,
    pub limit: Option<usize>,
}

pub async fn list_events(State(state): State<ApiState>, Query(params): Query<EventsParams>) -> Json<Vec<LearningEvent>> {
    let query = EventQuery {
        angel: params.angel,
        domain: params.domain,
        since: params.since,
        limit: params.limit,
    };
    Json(state.coordinator.events.query(&query))
}

pub async fn publish_learning_event(State(state): State<ApiState>, Json(event): Json<LearningEvent>) -> Result<Json<bool>, ApiError> {
    let triggers_snapshot = state.coordinator.events.append(event)?;
    Ok(Json(triggers_snapshot))
}

#[derive(Debug, Deserialize)]
pub struct DailySummaryParams {
    pub angel: Option<String>,
    pub domain: Option<String>,
}

pub async fn daily_summary(State(state): State<ApiState>, Query(params): Query<DailySummaryParams>) -> Json<crate::store::DailySummary> {
    Json(
        state
            .coordinator
            .events
            .daily_summary(params.angel.as_deref(), params.domain.as_deref()),
    )
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    #[serde(default)]
    pub period: PeriodParam,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodParam {
    OneHour,
    SixHours,
    #[default]
    TwentyFourHours,
    SevenDays,
}

impl From<PeriodParam> for Period {
    fn from(p: PeriodParam) -> Self {
        match p {
            PeriodParam::OneHour => Period::OneHour,
            PeriodParam::SixHours => Period::SixHours,
            PeriodParam::TwentyFourHours => Period::TwentyFourHours,
            PeriodParam::SevenDays => Period::SevenDays,
        }
    }
}

pub async fn insights(State(state): State<ApiState>, Query(params): Query<AnalyticsParams>) -> Json<crate::store::AnalyticsSnapshot> {
    Json(state.coordinator.events.analytics_snapshot(params.period.into()))
}

pub async fn patterns(State(state): State<ApiState>) -> Json<Vec<crate::types::AngelInsight>> {
    Json(state.coordinator.events.pattern_analysis())
}

pub async fn list_models(State(state): State<ApiState>) -> Json<Vec<Model>> {
    Json(state.coordinator.registry.list())
}

pub async fn model_versions(State(state): State<ApiState>, Path(name): Path<String>) -> Result<Json<Vec<DeploymentRecord>>, ApiError> {
    let model = state.coordinator.registry.lookup(&name)?;
    Ok(Json(model.deployment_history))
}

pub async fn improvement_tasks(State(state): State<ApiState>) -> Json<Vec<ImprovementTask>> {
    Json(state.coordinator.pipeline.tasks().await)
}

pub async fn trigger_improvement(State(state): State<ApiState>, Path(name): Path<String>) -> Result<Json<String>, ApiError> {
    Ok(Json(state.coordinator.pipeline.trigger_improvement(&name).await?))
}

pub async fn trigger_rollback(State(state): State<ApiState>, Path(name): Path<String>) -> Result<Json<Model>, ApiError> {
    let model = state.coordinator.registry.rollback(&name)?;
    crate::improvement::publish_model_update(&state.coordinator.bus, "model_rolled_back", &model).await;
    Ok(Json(model))
}

#[derive(Debug, Deserialize)]
pub struct AlertsParams {
    pub active_only: Option<bool>,
}

pub async fn list_alerts(State(state): State<ApiState>, Query(params): Query<AlertsParams>) -> Json<Vec<Alert>> {
    let alerts = if params.active_only.unwrap_or(false) {
        state.coordinator.monitoring.alerts.active()
    } else {
        state.coordinator.monitoring.alerts.all()
    };
    Json(alerts)
}

pub async fn list_incidents(State(state): State<ApiState>) -> Json<Vec<Incident>> {
    Json(state.coordinator.monitoring.incidents.all())
}

pub async fn acknowledge_alert(State(state): State<ApiState>, Path(id): Path<String>) -> Result<Json<()>, ApiError> {
    state.coordinator.monitoring.acknowledge_alert(&id)?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct ResolveIncidentBody {
    pub resolution: String,
}

pub async fn resolve_incident(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<ResolveIncidentBody>,
) -> Result<Json<()>, ApiError> {
    state.coordinator.monitoring.resolve_incident(&id, &body.resolution)?;
    Ok(Json(()))
}

pub async fn trigger_health_check(State(state): State<ApiState>) -> Json<crate::bus::HealthStatus> {
    state.coordinator.run_health_check().await;
    Json(state.coordinator.bus.health().await)
}

#[derive(Debug, Deserialize)]
pub struct ReportsParams {
    pub r#type: Option<crate::types::ReportType>,
}

pub async fn list_reports(State(state): State<ApiState>, Query(params): Query<ReportsParams>) -> Json<Vec<Report>> {
    let mut reports = state.coordinator.reporting.reports();
    if let Some(t) = params.r#type {
        reports.retain(|r| r.r#type == t);
    }
    Json(reports)
}

pub async fn list_documentation(State(state): State<ApiState>) -> Json<Vec<Report>> {
    Json(state.coordinator.reporting.documentation())
}

#[derive(Debug, Deserialize)]
pub struct GenerateReportBody {
    pub report_type: crate::types::ReportType,
    #[serde(default)]
    pub formats: Vec<crate::types::ReportFormat>,
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "24h".to_string()
}

pub async fn generate_report(State(state): State<ApiState>, Json(body): Json<GenerateReportBody>) -> Result<Json<Report>, ApiError> {
    let formats = if body.formats.is_empty() {
        vec![crate::types::ReportFormat::Markdown, crate::types::ReportFormat::Json]
    } else {
        body.formats
    };
    let options = crate::reporting::GenerateOptions { formats, period: body.period };
    let report = state.coordinator.reporting.generate(
        body.report_type,
        &options,
        &state.coordinator.events,
        &state.coordinator.registry,
        &state.coordinator.monitoring,
    )?;
    state.coordinator.publish_report_published(&report).await;
    Ok(Json(report))
}

pub async fn publish_experience(State(state): State<ApiState>, Json(experience): Json<Experience>) -> Json<()> {
    state.coordinator.experiences.enqueue(experience);
    Json(())
}

#[derive(Debug, Serialize)]
pub struct FlushResponse {
    pub flushed_streams: usize,
}

pub async fn flush_buffers(State(state): State<ApiState>) -> Json<FlushResponse> {
    let outcomes = state.coordinator.experiences.flush_all(state.coordinator.capability.as_ref()).await;
    Json(FlushResponse { flushed_streams: outcomes.len() })
}
