//! Documentation & Reporting (C7)
//!
//! Generates immutable, multi-format reports from C2/C4/C6 state on a
//! fixed schedule or on demand, refreshes API/architecture
//! documentation from the live registry, and enforces retention.

mod format;
mod templates;
pub mod scheduler;

pub use scheduler::{due_slots, ScheduleSlot, SLOTS};

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Local;

use crate::error::{ReportError, Result};
use crate::monitoring::MonitoringSystem;
use crate::registry::ModelRegistry;
use crate::store::EventStore;
use crate::types::{now_ms, Report, ReportFormat, ReportMetadata, ReportType};

pub struct GenerateOptions {
    pub formats: Vec<ReportFormat>,
    pub period: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            formats: vec![ReportFormat::Markdown, ReportFormat::Json],
            period: "24h".to_string(),
        }
    }
}

pub struct ReportingSystem {
    reports: RwLock<Vec<Report>>,
    documentation: RwLock<HashMap<String, Report>>,
    max_report_history: usize,
    last_fired: RwLock<Vec<Option<chrono::DateTime<Local>>>>,
}

impl ReportingSystem {
    pub fn new(max_report_history: usize) -> Self {
        Self {
            reports: RwLock::new(Vec::new()),
            documentation: RwLock::new(HashMap::new()),
            max_report_history,
            last_fired: RwLock::new(vec![None; SLOTS.len()]),
        }
    }

    pub fn generate(
        &self,
        report_type: ReportType,
        options: &GenerateOptions,
        events: &EventStore,
        registry: &ModelRegistry,
        monitoring: &MonitoringSystem,
    ) -> Result<Report> {
        if options.formats.is_empty() {
            return Err(ReportError::UnsupportedFormat("at least one format must be requested".to_string()).into());
        }
        let sections = templates::assemble(report_type, events, registry, monitoring);
        let title = report_type.template_name().replace('_', " ");

        let mut formatted = HashMap::new();
        for &format in &options.formats {
            match format::render(&title, &sections, format) {
                Ok(rendered) => {
                    formatted.insert(format, rendered);
                }
                Err(e) => {
                    tracing::warn!(?format, error = %e, "report format render failed, keeping other formats");
                }
            }
        }

        let report = Report {
            id: format!("{}-{}", report_type.template_name(), now_ms()),
            r#type: report_type,
            title,
            content: sections,
            formatted,
            metadata: ReportMetadata {
                generated_at: now_ms(),
                period: options.period.clone(),
                author: "cladc",
                version: 1,
            },
        };

        let mut reports = self.reports.write().expect("lock poisoned");
        reports.push(report.clone());
        while reports.len() > self.max_report_history {
            reports.remove(0);
        }
        Ok(report)
    }

    /// Evaluates the fixed schedule against `now` and returns which
    /// report types became due, marking them fired.
    pub fn due_schedule(&self, now: chrono::DateTime<Local>) -> Vec<ReportType> {
        let mut last_fired = self.last_fired.write().expect("lock poisoned");
        let due_idx = due_slots(now, &last_fired);
        for &idx in &due_idx {
            last_fired[idx] = Some(now);
        }
        due_idx.into_iter().map(|idx| SLOTS[idx].report_type).collect()
    }

    pub fn refresh_documentation(
        &self,
        registry: &ModelRegistry,
        monitoring: &MonitoringSystem,
    ) -> Result<()> {
        let events = EventStore::new(1); // documentation templates don't need event data
        let api = self.generate(
            ReportType::ApiDocumentation,
            &GenerateOptions { formats: vec![ReportFormat::Markdown], period: "live".to_string() },
            &events,
            registry,
            monitoring,
        )?;
        let arch = self.generate(
            ReportType::SystemArchitecture,
            &GenerateOptions { formats: vec![ReportFormat::Markdown], period: "live".to_string() },
            &events,
            registry,
            monitoring,
        )?;
        let mut docs = self.documentation.write().expect("lock poisoned");
        docs.insert("api_documentation".to_string(), api);
        docs.insert("system_architecture".to_string(), arch);
        Ok(())
    }

    pub fn cleanup(&self, retention_secs: u64) -> usize {
        let cutoff = now_ms() - retention_secs as i64 * 1000;
        let mut reports = self.reports.write().expect("lock poisoned");
        let before = reports.len();
        reports.retain(|r| r.metadata.generated_at >= cutoff);
        before - reports.len()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.read().expect("lock poisoned").clone()
    }

    pub fn report(&self, id: &str) -> Result<Report> {
        self.reports
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ReportError::NotFound(id.to_string()).into())
    }

    pub fn documentation(&self) -> Vec<Report> {
        self.documentation.read().expect("lock poisoned").values().cloned().collect()
    }

    pub fn restore(reports: Vec<Report>, documentation: HashMap<String, Report>, max_report_history: usize) -> Self {
        Self {
            reports: RwLock::new(reports),
            documentation: RwLock::new(documentation),
            max_report_history,
            last_fired: RwLock::new(vec![None; SLOTS.len()]),
        }
    }

    pub fn snapshot_reports(&self) -> Vec<Report> {
        self.reports()
    }

    pub fn snapshot_documentation(&self) -> HashMap<String, Report> {
        self.documentation.read().expect("lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlertThresholds, EscalationRules};

    #[test]
    fn generate_daily_summary_produces_report_with_requested_formats() {
        let events = EventStore::new(1000);
        let registry = ModelRegistry::new(10, 5, 100);
        let monitoring = MonitoringSystem::new(1000, AlertThresholds::default(), EscalationRules::default());
        let reporting = ReportingSystem::new(1000);

        let report = reporting
            .generate(ReportType::DailySummary, &GenerateOptions::default(), &events, &registry, &monitoring)
            .unwrap();
        assert!(report.formatted.contains_key(&ReportFormat::Markdown));
        assert!(report.formatted.contains_key(&ReportFormat::Json));
    }

    #[test]
    fn generate_with_no_formats_is_validation_error() {
        let events = EventStore::new(1000);
        let registry = ModelRegistry::new(10, 5, 100);
        let monitoring = MonitoringSystem::new(1000, AlertThresholds::default(), EscalationRules::default());
        let reporting = ReportingSystem::new(1000);
        let err = reporting
            .generate(ReportType::DailySummary, &GenerateOptions { formats: vec![], period: "24h".to_string() }, &events, &registry, &monitoring)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
