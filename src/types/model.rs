use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::capability::{SmokeTestOutcome, TrainOutcome};
use super::Timestamp;

/// Semantic version, restricted to the `PATCH`-increment discipline C4
/// uses for every deploy. Serializes as the plain `MAJOR.MINOR.PATCH`
/// string used throughout bus payloads and the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    #[must_use]
    pub const fn bump_patch(self) -> Self {
        Self {
            patch: self.patch + 1,
            ..self
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl std::str::FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut next = || {
            parts
                .next()
                .ok_or_else(|| format!("malformed version: {s}"))?
                .parse::<u32>()
                .map_err(|e| e.to_string())
        };
        let major = next()?;
        let minor = next()?;
        let patch = next()?;
        Ok(Self::new(major, minor, patch))
    }
}

impl Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Classification,
    ReinforcementLearning,
    ComputerVision,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Active,
    Deploying,
    Degraded,
    Retired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelHealth {
    pub healthy: bool,
    pub last_checked: Timestamp,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentEvent {
    ModelDeployed,
    ModelRolledBack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub version: Version,
    pub performance: f64,
    pub timestamp: Timestamp,
    pub event: DeploymentEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBackup {
    pub version: Version,
    pub performance: f64,
    pub metrics: HashMap<String, f64>,
    pub timestamp: Timestamp,
}

/// A named improvable capability at its current active version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub r#type: ModelType,
    pub version: Version,
    pub status: ModelStatus,
    pub components: Vec<String>,
    pub current_performance: f64,
    pub metrics: HashMap<String, f64>,
    pub health: ModelHealth,
    pub deployment_history: Vec<DeploymentRecord>,
    pub backups: Vec<ModelBackup>,
    pub last_updated: Timestamp,
}

impl Model {
    pub const MAX_BACKUPS: usize = 5;
}

/// Bounded, per-model time series recorded by `record_performance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub overall: f64,
    pub metrics: HashMap<String, f64>,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub kind: String,
    pub severity: IssueSeverity,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Pending,
    Completed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub performance: f64,
    pub threshold: f64,
    pub stability_variance: f64,
    pub trend_declining: bool,
}

/// Per-step status markers. `analyze`/`collect_data`/.../`deploy` form a
/// strictly forward inner sequence inside one `ImprovementTask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTracker {
    pub analyze: StepOutcome,
    pub collect_data: StepOutcome,
    pub train: StepOutcome,
    pub validate: StepOutcome,
    pub test_deploy: StepOutcome,
    pub deploy: StepOutcome,
}

impl Default for StepTracker {
    fn default() -> Self {
        Self {
            analyze: StepOutcome::Pending,
            collect_data: StepOutcome::Pending,
            train: StepOutcome::Pending,
            validate: StepOutcome::Pending,
            test_deploy: StepOutcome::Pending,
            deploy: StepOutcome::Pending,
        }
    }
}

/// State machine coordinating a single model improvement, from the
/// triggering issue through to deployment or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementTask {
    pub id: String,
    pub model_name: String,
    pub issue: Issue,
    pub priority: Priority,
    pub status: TaskStatus,
    pub steps: StepTracker,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub failed_at: Option<Timestamp>,
    pub analysis: Option<AnalysisResult>,
    pub training_result: Option<TrainOutcome>,
    pub validation: Option<ValidationResult>,
    pub deployment_test: Option<SmokeTestOutcome>,
    pub deployment: Option<DeploymentRecord>,
    /// `rigorous` retraining-path tasks use a stricter validation
    /// threshold (0.75 vs the default 0.7).
    pub rigorous: bool,
}
