//! Error taxonomy shared by every component.
//!
//! Each component defines its own `thiserror` enum close to where its
//! failures originate; this module collects them behind one kind tag so
//! the Control API and bus status fields never have to match on a
//! per-component type.

use thiserror::Error;

/// Stable error kind tag, serialized verbatim in API error bodies and
/// bus status payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BusUnavailable,
    Serialization,
    Timeout,
    Validation,
    CapacityExceeded,
    NotFound,
    Conflict,
    StepFailed,
    Fatal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BusUnavailable => "bus_unavailable",
            Self::Serialization => "serialization",
            Self::Timeout => "timeout",
            Self::Validation => "validation",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::StepFailed => "step_failed",
            Self::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Crate-wide error type. Component errors convert into this via `From`
/// so callers at a coordinator or API boundary deal with one type.
#[derive(Debug, Error)]
pub enum CladcError {
    #[error("bus unavailable: {0}")]
    BusUnavailable(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("step failed: {0}")]
    StepFailed(String),

    #[error("fatal error: {0}")]
    Fatal(String),
}

impl CladcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BusUnavailable(_) => ErrorKind::BusUnavailable,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Validation(_) => ErrorKind::Validation,
            Self::CapacityExceeded(_) => ErrorKind::CapacityExceeded,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::StepFailed(_) => ErrorKind::StepFailed,
            Self::Fatal(_) => ErrorKind::Fatal,
        }
    }
}

impl From<serde_json::Error> for CladcError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for CladcError {
    fn from(e: std::io::Error) -> Self {
        Self::Fatal(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for CladcError {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        Self::Timeout(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CladcError>;

/// Bus adapter (C1) errors.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("backend unavailable for channel {channel}: {reason}")]
    Unavailable { channel: String, reason: String },
    #[error("no subscribers on channel {0}")]
    NoSubscribers(String),
    #[error("reconnect budget exhausted for backend {0}")]
    ReconnectExhausted(String),
}

impl From<BusError> for CladcError {
    fn from(e: BusError) -> Self {
        Self::BusUnavailable(e.to_string())
    }
}

/// Event store (C2) errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event store capacity exceeded (max {max})")]
    CapacityExceeded { max: usize },
    #[error("event {0} not found")]
    NotFound(String),
    #[error("snapshot io failed: {0}")]
    Io(String),
}

impl From<StoreError> for CladcError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::CapacityExceeded { .. } => Self::CapacityExceeded(e.to_string()),
            StoreError::NotFound(_) => Self::NotFound(e.to_string()),
            StoreError::Io(_) => Self::Fatal(e.to_string()),
        }
    }
}

/// Model registry (C4) errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model {0} not found")]
    ModelNotFound(String),
    #[error("version {version} not found for model {model}")]
    VersionNotFound { model: String, version: String },
    #[error("deploy conflict: model {0} is already mid-deploy")]
    DeployInProgress(String),
    #[error("invalid version bump: {0}")]
    InvalidVersion(String),
}

impl From<RegistryError> for CladcError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::ModelNotFound(_) | RegistryError::VersionNotFound { .. } => {
                Self::NotFound(e.to_string())
            }
            RegistryError::DeployInProgress(_) => Self::Conflict(e.to_string()),
            RegistryError::InvalidVersion(_) => Self::Validation(e.to_string()),
        }
    }
}

/// Improvement pipeline (C5) errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("task {0} not found")]
    TaskNotFound(String),
    #[error("step {step} failed for task {task}: {reason}")]
    StepFailed {
        task: String,
        step: String,
        reason: String,
    },
    #[error("max concurrent tasks ({0}) reached")]
    AtCapacity(usize),
}

impl From<PipelineError> for CladcError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::TaskNotFound(_) => Self::NotFound(e.to_string()),
            PipelineError::StepFailed { .. } => Self::StepFailed(e.to_string()),
            PipelineError::AtCapacity(_) => Self::CapacityExceeded(e.to_string()),
        }
    }
}

/// Monitoring & alerting (C6) errors.
#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("alert {0} not found")]
    AlertNotFound(String),
    #[error("incident {0} not found")]
    IncidentNotFound(String),
    #[error("monitor {0} not registered")]
    MonitorNotRegistered(String),
}

impl From<MonitoringError> for CladcError {
    fn from(e: MonitoringError) -> Self {
        Self::NotFound(e.to_string())
    }
}

/// Documentation & reporting (C7) errors.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report {0} not found")]
    NotFound(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("render failed: {0}")]
    RenderFailed(String),
}

impl From<ReportError> for CladcError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::NotFound(_) => Self::NotFound(e.to_string()),
            ReportError::UnsupportedFormat(_) => Self::Validation(e.to_string()),
            ReportError::RenderFailed(_) => Self::Fatal(e.to_string()),
        }
    }
}

/// Persistence layer (C9) errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write snapshot {path}: {reason}")]
    WriteFailed { path: String, reason: String },
    #[error("failed to read snapshot {path}: {reason}")]
    ReadFailed { path: String, reason: String },
    #[error("snapshot {path} corrupt: {reason}")]
    Corrupt { path: String, reason: String },
}

impl From<PersistenceError> for CladcError {
    fn from(e: PersistenceError) -> Self {
        Self::Fatal(e.to_string())
    }
}
