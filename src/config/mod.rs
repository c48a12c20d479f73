//! Configuration Module
//!
//! CLADC's configuration is an immutable struct constructed once at
//! startup (`CladcConfig::load`) and installed into a process-wide
//! handle via `init()`/`get()`. Dynamic tuning never mutates that
//! booted struct in place — `reconfigure(patch)` builds a new
//! `CladcConfig` and atomically swaps it behind an `arc_swap::ArcSwap`,
//! so readers always observe a fully-formed configuration.
//!
//! ## Loading order
//!
//! 1. `CLADC_CONFIG` environment variable (path to a TOML file).
//! 2. `cladc.toml` in the current working directory.
//! 3. Built-in defaults (`config::defaults`).

pub mod defaults;
mod validation;

pub use validation::validate;

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::types::AlertSeverity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub cpu_usage_pct: f64,
    pub memory_usage_pct: f64,
    pub error_rate_pct: f64,
    pub response_time_ms: f64,
    pub throughput_drop_pct: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            cpu_usage_pct: defaults::ALERT_CPU_USAGE_PCT,
            memory_usage_pct: defaults::ALERT_MEMORY_USAGE_PCT,
            error_rate_pct: defaults::ALERT_ERROR_RATE_PCT,
            response_time_ms: defaults::ALERT_RESPONSE_TIME_MS,
            throughput_drop_pct: defaults::ALERT_THROUGHPUT_DROP_PCT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRules {
    pub critical_secs: u64,
    pub critical_target: String,
    pub high_secs: u64,
    pub high_target: String,
    pub medium_secs: u64,
    pub medium_target: String,
}

impl Default for EscalationRules {
    fn default() -> Self {
        Self {
            critical_secs: 5 * 60,
            critical_target: "admin".to_string(),
            high_secs: 15 * 60,
            high_target: "team".to_string(),
            medium_secs: 30 * 60,
            medium_target: "monitoring".to_string(),
        }
    }
}

impl EscalationRules {
    pub fn timeout_and_target(&self, severity: AlertSeverity) -> Option<(u64, String)> {
        match severity {
            AlertSeverity::Critical => Some((self.critical_secs, self.critical_target.clone())),
            AlertSeverity::High => Some((self.high_secs, self.high_target.clone())),
            AlertSeverity::Medium => Some((self.medium_secs, self.medium_target.clone())),
            AlertSeverity::Low => None,
        }
    }
}

/// Immutable process configuration. Every field here has a documented
/// default in `config::defaults` and a matching entry in the external
/// interface's configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CladcConfig {
    pub learning_interval_secs: u64,
    pub development_interval_secs: u64,
    pub improvement_interval_secs: u64,
    pub model_validation_interval_secs: u64,
    pub deployment_interval_secs: u64,

    pub monitoring_interval_secs: u64,
    pub health_check_interval_secs: u64,

    pub report_generation_interval_secs: u64,
    pub documentation_update_interval_secs: u64,

    pub flush_interval_secs: u64,
    pub real_time_sync_interval_secs: u64,
    pub batch_size: usize,
    pub max_buffer_size: usize,

    pub max_events: usize,
    pub max_model_versions: usize,
    pub max_backups: usize,
    pub max_report_history: usize,
    pub max_performance_samples: usize,
    pub max_metric_samples: usize,

    pub retention_period_events_secs: u64,
    pub retention_period_alerts_secs: u64,
    pub retention_period_reports_secs: u64,

    pub performance_threshold: f64,
    pub improvement_threshold: f64,
    pub validation_threshold: f64,
    pub rigorous_validation_threshold: f64,
    pub stability_variance_threshold: f64,
    pub smoke_test_pass_threshold: f64,

    pub alert_thresholds: AlertThresholds,
    pub escalation_rules: EscalationRules,

    pub max_concurrent_tasks: usize,

    pub train_deadline_secs: u64,
    pub data_collection_deadline_secs: u64,
    pub deployment_test_deadline_secs: u64,
    pub inference_deadline_secs: u64,

    pub bus_reconnect_min_backoff_ms: u64,
    pub bus_reconnect_max_backoff_ms: u64,
    pub shutdown_grace_secs: u64,

    pub auto_recovery: bool,
    pub enable_ab_testing: bool,
    pub enable_auto_deployment: bool,
    pub backup_before_update: bool,
    pub enable_version_control: bool,

    pub data_dir: String,
    pub reports_dir: String,
    pub docs_dir: String,
    pub logs_dir: String,
    pub generated_dir: String,
}

impl Default for CladcConfig {
    fn default() -> Self {
        Self {
            learning_interval_secs: defaults::LEARNING_INTERVAL_SECS,
            development_interval_secs: defaults::DEVELOPMENT_INTERVAL_SECS,
            improvement_interval_secs: defaults::IMPROVEMENT_INTERVAL_SECS,
            model_validation_interval_secs: defaults::MODEL_VALIDATION_INTERVAL_SECS,
            deployment_interval_secs: defaults::DEPLOYMENT_INTERVAL_SECS,

            monitoring_interval_secs: defaults::MONITORING_INTERVAL_SECS,
            health_check_interval_secs: defaults::HEALTH_CHECK_INTERVAL_SECS,

            report_generation_interval_secs: defaults::REPORT_GENERATION_INTERVAL_SECS,
            documentation_update_interval_secs: defaults::DOCUMENTATION_UPDATE_INTERVAL_SECS,

            flush_interval_secs: defaults::FLUSH_INTERVAL_SECS,
            real_time_sync_interval_secs: defaults::REAL_TIME_SYNC_INTERVAL_SECS,
            batch_size: defaults::BATCH_SIZE,
            max_buffer_size: defaults::MAX_BUFFER_SIZE,

            max_events: defaults::MAX_EVENTS,
            max_model_versions: defaults::MAX_MODEL_VERSIONS,
            max_backups: defaults::MAX_BACKUPS,
            max_report_history: defaults::MAX_REPORT_HISTORY,
            max_performance_samples: defaults::MAX_PERFORMANCE_SAMPLES,
            max_metric_samples: defaults::MAX_METRIC_SAMPLES,

            retention_period_events_secs: defaults::RETENTION_PERIOD_EVENTS_SECS,
            retention_period_alerts_secs: defaults::RETENTION_PERIOD_ALERTS_SECS,
            retention_period_reports_secs: defaults::RETENTION_PERIOD_REPORTS_SECS,

            performance_threshold: defaults::PERFORMANCE_THRESHOLD,
            improvement_threshold: defaults::IMPROVEMENT_THRESHOLD,
            validation_threshold: defaults::VALIDATION_THRESHOLD,
            rigorous_validation_threshold: defaults::RIGOROUS_VALIDATION_THRESHOLD,
            stability_variance_threshold: defaults::STABILITY_VARIANCE_THRESHOLD,
            smoke_test_pass_threshold: defaults::SMOKE_TEST_PASS_THRESHOLD,

            alert_thresholds: AlertThresholds::default(),
            escalation_rules: EscalationRules::default(),

            max_concurrent_tasks: defaults::MAX_CONCURRENT_TASKS,

            train_deadline_secs: defaults::TRAIN_DEADLINE_SECS,
            data_collection_deadline_secs: defaults::DATA_COLLECTION_DEADLINE_SECS,
            deployment_test_deadline_secs: defaults::DEPLOYMENT_TEST_DEADLINE_SECS,
            inference_deadline_secs: defaults::INFERENCE_DEADLINE_SECS,

            bus_reconnect_min_backoff_ms: defaults::BUS_RECONNECT_MIN_BACKOFF_MS,
            bus_reconnect_max_backoff_ms: defaults::BUS_RECONNECT_MAX_BACKOFF_MS,
            shutdown_grace_secs: defaults::SHUTDOWN_GRACE_SECS,

            auto_recovery: defaults::AUTO_RECOVERY,
            enable_ab_testing: defaults::ENABLE_AB_TESTING,
            enable_auto_deployment: defaults::ENABLE_AUTO_DEPLOYMENT,
            backup_before_update: defaults::BACKUP_BEFORE_UPDATE,
            enable_version_control: defaults::ENABLE_VERSION_CONTROL,

            data_dir: defaults::DATA_DIR.to_string(),
            reports_dir: defaults::REPORTS_DIR.to_string(),
            docs_dir: defaults::DOCS_DIR.to_string(),
            logs_dir: defaults::LOGS_DIR.to_string(),
            generated_dir: defaults::GENERATED_DIR.to_string(),
        }
    }
}

impl CladcConfig {
    pub const fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub const fn monitoring_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring_interval_secs)
    }

    pub const fn improvement_interval(&self) -> Duration {
        Duration::from_secs(self.improvement_interval_secs)
    }

    /// Load following the documented precedence: `CLADC_CONFIG` env var,
    /// then `cladc.toml` in the working directory, then built-in
    /// defaults.
    pub fn load() -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = std::env::var("CLADC_CONFIG").ok().map(std::path::PathBuf::from);
        let path = path.or_else(|| {
            let cwd = Path::new("cladc.toml");
            cwd.exists().then(|| cwd.to_path_buf())
        });

        let cfg = if let Some(path) = path {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {path:?}"))?;
            toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file {path:?}"))?
        } else {
            tracing::info!("no config file found, using built-in defaults");
            Self::default()
        };

        if let Err(errors) = validate(&cfg) {
            anyhow::bail!("invalid configuration: {}", errors.join("; "));
        }

        Ok(cfg)
    }
}

/// Global configuration handle, initialized once at startup.
static CONFIG: OnceLock<ArcSwap<CladcConfig>> = OnceLock::new();

/// Install the booted configuration. Must be called exactly once before
/// any call to `get()`.
pub fn init(config: CladcConfig) {
    if CONFIG.set(ArcSwap::new(std::sync::Arc::new(config))).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Current configuration snapshot. Panics if `init()` has not run yet —
/// a missing config is a startup bug, not a recoverable condition.
pub fn get() -> std::sync::Arc<CladcConfig> {
    CONFIG
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
        .load_full()
}

pub fn is_initialized() -> bool {
    CONFIG.get().is_some()
}

/// Apply a partial patch to the current configuration and atomically
/// install the result. `patch` receives a clone of the current config
/// and returns the new one; validation runs before the swap so a bad
/// patch never reaches readers.
pub fn reconfigure(
    patch: impl FnOnce(CladcConfig) -> CladcConfig,
) -> Result<(), Vec<String>> {
    let handle = CONFIG
        .get()
        .expect("config::reconfigure() called before config::init()");
    let current = (**handle.load()).clone();
    let next = patch(current);
    validate(&next)?;
    handle.store(std::sync::Arc::new(next));
    Ok(())
}
