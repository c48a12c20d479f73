use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    DailySummary,
    PerformanceReport,
    LearningInsights,
    SystemStatus,
    ApiDocumentation,
    SystemArchitecture,
}

impl ReportType {
    pub const fn template_name(self) -> &'static str {
        match self {
            Self::DailySummary => "daily_summary",
            Self::PerformanceReport => "performance_report",
            Self::LearningInsights => "learning_insights",
            Self::SystemStatus => "system_status",
            Self::ApiDocumentation => "api_documentation",
            Self::SystemArchitecture => "system_architecture",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Markdown,
    Html,
    Json,
}

impl ReportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: String,
    pub children: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: Timestamp,
    pub period: String,
    pub author: &'static str,
    pub version: u32,
}

/// An immutable document assembled by C7. If a format conversion fails
/// the report is still kept for whichever formats did succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub r#type: ReportType,
    pub title: String,
    pub content: Vec<Section>,
    pub formatted: HashMap<ReportFormat, String>,
    pub metadata: ReportMetadata,
}
