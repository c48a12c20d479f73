//! Trigger-source selection for the scheduled sweep and retraining
//! path (§4.5). Pure selection logic kept separate from the pipeline
//! state machine so the coordinator's periodic loops can call these
//! directly against a registry snapshot.

use crate::types::{now_ms, Model};

/// Models with `current_performance < 0.8`, unhealthy, or not updated
/// in the last 24h are candidates for the regular improvement sweep.
pub fn select_sweep_candidates(models: &[Model]) -> Vec<String> {
    let stale_cutoff = now_ms() - 24 * 3600 * 1000;
    models
        .iter()
        .filter(|m| m.current_performance < 0.8 || !m.health.healthy || m.last_updated < stale_cutoff)
        .map(|m| m.name.clone())
        .collect()
}

/// Stricter retraining path: `current_performance < 0.75` or stale
/// beyond 7 days.
pub fn select_retraining_candidates(models: &[Model]) -> Vec<String> {
    let stale_cutoff = now_ms() - 7 * 24 * 3600 * 1000;
    models
        .iter()
        .filter(|m| m.current_performance < 0.75 || m.last_updated < stale_cutoff)
        .map(|m| m.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelHealth, ModelStatus, ModelType, Version};
    use std::collections::HashMap;

    fn model(name: &str, performance: f64, healthy: bool, last_updated: i64) -> Model {
        Model {
            name: name.to_string(),
            r#type: ModelType::Generic,
            version: Version::new(1, 0, 0),
            status: ModelStatus::Active,
            components: vec![],
            current_performance: performance,
            metrics: HashMap::new(),
            health: ModelHealth { healthy, last_checked: 0, issues: vec![] },
            deployment_history: vec![],
            backups: vec![],
            last_updated,
        }
    }

    #[test]
    fn unhealthy_model_is_a_sweep_candidate_regardless_of_performance() {
        let m = model("m", 0.95, false, now_ms());
        assert_eq!(select_sweep_candidates(&[m]), vec!["m".to_string()]);
    }

    #[test]
    fn healthy_recent_high_performer_is_not_a_candidate() {
        let m = model("m", 0.95, true, now_ms());
        assert!(select_sweep_candidates(&[m]).is_empty());
    }

    #[test]
    fn stale_model_is_a_retraining_candidate() {
        let stale = now_ms() - 8 * 24 * 3600 * 1000;
        let m = model("m", 0.95, true, stale);
        assert_eq!(select_retraining_candidates(&[m]), vec!["m".to_string()]);
    }
}
