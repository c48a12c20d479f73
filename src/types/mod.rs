//! Domain types shared across components.
//!
//! Every type that crosses the Control API or a JSON snapshot boundary
//! derives `Serialize`/`Deserialize` so no shadow DTO layer is needed.

mod alert;
mod capability;
mod event;
mod experience;
mod model;
mod report;

pub use alert::{Alert, AlertSeverity, Incident, IncidentStatus, Monitor, MonitorType};
pub use capability::{
    Capability, CollectDataOutcome, InferOutcome, SmokeTestOutcome, TrainOutcome,
};
pub use event::{AngelInsight, EventOutcome, InsightType, LearningEvent};
pub use experience::Experience;
pub use model::{
    AnalysisResult, DeploymentEvent, DeploymentRecord, ImprovementTask, Issue, IssueSeverity,
    Model, ModelBackup, ModelHealth, ModelStatus, ModelType, PerformanceSample, Priority,
    StepOutcome, StepTracker, TaskStatus, ValidationResult, Version,
};
pub use report::{Report, ReportFormat, ReportMetadata, ReportType, Section};

/// Wall clock timestamp, milliseconds since the Unix epoch. Stored as a
/// plain integer so it serializes identically in snapshots and API
/// bodies without a platform-specific `SystemTime`.
pub type Timestamp = i64;

/// Current wall-clock timestamp in milliseconds.
pub fn now_ms() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Every bus-originated or bus-emitted entity threads the originating
/// message's correlation id through, so log lines can be grepped across
/// components for one request.
pub trait Correlated {
    fn correlation_id(&self) -> Option<&str>;
}
