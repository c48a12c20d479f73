//! Per-report-type section assembly (§4.7). Each template pulls from
//! C2 (events), C4 (models), and C6 (monitoring) and returns a section
//! tree; formatting into Markdown/HTML/JSON happens afterward in
//! `format.rs`.

use crate::monitoring::MonitoringSystem;
use crate::registry::ModelRegistry;
use crate::store::{EventStore, Period};
use crate::types::{Alert, Incident, Model, ReportType, Section};

pub fn assemble(
    report_type: ReportType,
    events: &EventStore,
    registry: &ModelRegistry,
    monitoring: &MonitoringSystem,
) -> Vec<Section> {
    match report_type {
        ReportType::DailySummary => daily_summary(events),
        ReportType::PerformanceReport => performance_report(registry),
        ReportType::LearningInsights => learning_insights(events),
        ReportType::SystemStatus => system_status(registry, monitoring),
        ReportType::ApiDocumentation => api_documentation(),
        ReportType::SystemArchitecture => system_architecture(),
    }
}

fn daily_summary(events: &EventStore) -> Vec<Section> {
    let summary = events.daily_summary(None, None);
    let snapshot = events.analytics_snapshot(Period::TwentyFourHours);
    vec![
        Section {
            heading: "Overview".to_string(),
            body: format!(
                "{} events, {:.1}% success rate, {:.1}ms average processing time.",
                summary.count, summary.success_rate, summary.avg_processing_time
            ),
            children: vec![],
        },
        Section {
            heading: "Top Domains".to_string(),
            body: summary
                .top_domains
                .iter()
                .map(|(domain, count)| format!("- {domain}: {count}"))
                .collect::<Vec<_>>()
                .join("\n"),
            children: vec![],
        },
        Section {
            heading: "Trend".to_string(),
            body: format!("{:?} over the trailing 24h window.", snapshot.trend),
            children: vec![],
        },
    ]
}

fn performance_report(registry: &ModelRegistry) -> Vec<Section> {
    let models = registry.list();
    let body = models
        .iter()
        .map(|m| {
            format!(
                "- {} v{}: performance {:.2}, status {:?}",
                m.name, m.version, m.current_performance, m.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    vec![Section {
        heading: "Model Performance".to_string(),
        body,
        children: drift_sections(registry, &models),
    }]
}

fn drift_sections(registry: &ModelRegistry, models: &[Model]) -> Vec<Section> {
    models
        .iter()
        .filter_map(|m| {
            let drift = registry.drift_indicator(&m.name).ok()?;
            drift.detected.then(|| Section {
                heading: format!("Drift: {}", m.name),
                body: format!("magnitude {:.3}, severity {:?}", drift.magnitude, drift.severity),
                children: vec![],
            })
        })
        .collect()
}

fn learning_insights(events: &EventStore) -> Vec<Section> {
    let insights = events.insights();
    let body = if insights.is_empty() {
        "No insights recorded in this window.".to_string()
    } else {
        insights
            .iter()
            .rev()
            .take(20)
            .map(|i| format!("- {:?} `{}` (significance {:.2})", i.r#type, i.pattern_key, i.significance))
            .collect::<Vec<_>>()
            .join("\n")
    };
    vec![Section {
        heading: "Learning Insights".to_string(),
        body,
        children: vec![],
    }]
}

fn system_status(registry: &ModelRegistry, monitoring: &MonitoringSystem) -> Vec<Section> {
    let models = registry.list();
    let alerts: Vec<Alert> = monitoring.alerts.active();
    let incidents: Vec<Incident> = monitoring
        .incidents
        .all()
        .into_iter()
        .filter(|i| i.status != crate::types::IncidentStatus::Resolved)
        .collect();
    vec![
        Section {
            heading: "Models".to_string(),
            body: format!("{} registered models.", models.len()),
            children: vec![],
        },
        Section {
            heading: "Active Alerts".to_string(),
            body: format!("{} active alerts.", alerts.len()),
            children: vec![],
        },
        Section {
            heading: "Open Incidents".to_string(),
            body: format!("{} open incidents.", incidents.len()),
            children: vec![],
        },
    ]
}

fn api_documentation() -> Vec<Section> {
    vec![Section {
        heading: "Control API".to_string(),
        body: "Full operation \
               list: status, events, daily_summary, insights, patterns, models, \
               model_versions, improvement_tasks, trigger_improvement, \
               trigger_rollback, alerts, incidents, acknowledge_alert, \
               resolve_incident, trigger_health_check, reports, documentation, \
               generate_report, publish_experience, publish_learning_event, \
               flush_buffers."
            .to_string(),
        children: vec![],
    }]
}

fn system_architecture() -> Vec<Section> {
    vec![Section {
        heading: "Components".to_string(),
        body: "Bus Adapter, Event Store, Experience Stream Buffer, Model \
               Registry, Improvement Pipeline, Monitoring & Alerting, \
               Documentation & Reporting, Coordinator, Persistence Layer, \
               Control API."
            .to_string(),
        children: vec![],
    }]
}
