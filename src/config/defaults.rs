//! Built-in default values, one constant per recognized configuration
//! option in the external interface table.

pub const LEARNING_INTERVAL_SECS: u64 = 300;
pub const DEVELOPMENT_INTERVAL_SECS: u64 = 600;
pub const IMPROVEMENT_INTERVAL_SECS: u64 = 900;
pub const MODEL_VALIDATION_INTERVAL_SECS: u64 = 1800;
pub const DEPLOYMENT_INTERVAL_SECS: u64 = 3600;

pub const MONITORING_INTERVAL_SECS: u64 = 60;
pub const HEALTH_CHECK_INTERVAL_SECS: u64 = 300;

pub const REPORT_GENERATION_INTERVAL_SECS: u64 = 3600;
pub const DOCUMENTATION_UPDATE_INTERVAL_SECS: u64 = 7200;

pub const FLUSH_INTERVAL_SECS: u64 = 30;
pub const BATCH_SIZE: usize = 100;
pub const MAX_BUFFER_SIZE: usize = 10_000;
pub const REAL_TIME_SYNC_INTERVAL_SECS: u64 = 5;

pub const MAX_EVENTS: usize = 50_000;
pub const MAX_MODEL_VERSIONS: usize = 10;
pub const MAX_BACKUPS: usize = 5;
pub const MAX_REPORT_HISTORY: usize = 1000;
pub const MAX_PERFORMANCE_SAMPLES: usize = 100;
pub const MAX_METRIC_SAMPLES: usize = 10_000;

pub const RETENTION_PERIOD_EVENTS_SECS: u64 = 7 * 24 * 3600;
pub const RETENTION_PERIOD_ALERTS_SECS: u64 = 7 * 24 * 3600;
pub const RETENTION_PERIOD_REPORTS_SECS: u64 = 30 * 24 * 3600;

pub const PERFORMANCE_THRESHOLD: f64 = 0.05;
pub const IMPROVEMENT_THRESHOLD: f64 = 0.05;
pub const VALIDATION_THRESHOLD: f64 = 0.7;
pub const RIGOROUS_VALIDATION_THRESHOLD: f64 = 0.75;
pub const STABILITY_VARIANCE_THRESHOLD: f64 = 0.01;
pub const SMOKE_TEST_PASS_THRESHOLD: f64 = 0.9;

pub const ALERT_CPU_USAGE_PCT: f64 = 80.0;
pub const ALERT_MEMORY_USAGE_PCT: f64 = 85.0;
pub const ALERT_ERROR_RATE_PCT: f64 = 5.0;
pub const ALERT_RESPONSE_TIME_MS: f64 = 2000.0;
pub const ALERT_THROUGHPUT_DROP_PCT: f64 = 20.0;

pub const MAX_CONCURRENT_TASKS: usize = 3;

pub const TRAIN_DEADLINE_SECS: u64 = 600;
pub const DATA_COLLECTION_DEADLINE_SECS: u64 = 120;
pub const DEPLOYMENT_TEST_DEADLINE_SECS: u64 = 60;
pub const INFERENCE_DEADLINE_SECS: u64 = 5;

pub const BUS_RECONNECT_MIN_BACKOFF_MS: u64 = 250;
pub const BUS_RECONNECT_MAX_BACKOFF_MS: u64 = 30_000;

pub const SHUTDOWN_GRACE_SECS: u64 = 5;

pub const AUTO_RECOVERY: bool = true;
pub const ENABLE_AB_TESTING: bool = true;
pub const ENABLE_AUTO_DEPLOYMENT: bool = true;
pub const BACKUP_BEFORE_UPDATE: bool = true;
pub const ENABLE_VERSION_CONTROL: bool = true;

pub const DATA_DIR: &str = "data";
pub const REPORTS_DIR: &str = "reports";
pub const DOCS_DIR: &str = "docs";
pub const LOGS_DIR: &str = "logs";
pub const GENERATED_DIR: &str = "generated";
