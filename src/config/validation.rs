use super::CladcConfig;

/// Validates a loaded or patched configuration. Returns every violation
/// found rather than bailing on the first, so operators see the whole
/// picture in one error.
pub fn validate(cfg: &CladcConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if cfg.batch_size == 0 {
        errors.push("batchSize must be > 0".to_string());
    }
    if cfg.max_buffer_size < cfg.batch_size {
        errors.push("maxBufferSize must be >= batchSize".to_string());
    }
    if cfg.max_events == 0 {
        errors.push("maxEvents must be > 0".to_string());
    }
    if cfg.max_concurrent_tasks == 0 {
        errors.push("maxConcurrentTasks must be > 0".to_string());
    }
    if !(0.0..=1.0).contains(&cfg.validation_threshold) {
        errors.push("modelValidationThreshold must be within [0,1]".to_string());
    }
    if !(0.0..=1.0).contains(&cfg.performance_threshold) {
        errors.push("performanceThreshold must be within [0,1]".to_string());
    }
    if cfg.max_model_versions == 0 {
        errors.push("maxModelVersions must be > 0".to_string());
    }
    if cfg.alert_thresholds.cpu_usage_pct <= 0.0 || cfg.alert_thresholds.cpu_usage_pct > 100.0 {
        errors.push("alertThresholds.cpuUsage must be within (0,100]".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
