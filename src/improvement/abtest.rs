//! A/B test ledger (§4.5). Every `improvementInterval * 3`, each model
//! with >= 2 versions in its deployment history is enrolled in a test
//! comparing its current and previous version over a 30-minute window.

use serde::{Deserialize, Serialize};

use crate::types::{now_ms, Model, Timestamp};

pub const TEST_DURATION_SECS: i64 = 30 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbTestWinner {
    Current,
    Previous,
    NoWinner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTest {
    pub model_name: String,
    pub current_version: String,
    pub previous_version: String,
    pub current_performance: f64,
    pub previous_performance: f64,
    pub started_at: Timestamp,
    pub ends_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTestOutcome {
    pub model_name: String,
    pub winner: AbTestWinner,
    /// `current_performance - previous_performance`; positive favors
    /// the current arm.
    pub improvement: f64,
    pub suggest_deployment: bool,
}

/// Enqueues an A/B test for `model` if it has at least two entries in
/// its deployment history (current version vs. the one immediately
/// prior). Returns `None` when there are fewer than two versions, per
/// "A/B test with only one version (skipped)" in §8.
pub fn enroll(model: &Model) -> Option<AbTest> {
    let history = &model.deployment_history;
    if history.len() < 2 {
        return None;
    }
    let current = &history[history.len() - 1];
    let previous = &history[history.len() - 2];
    let now = now_ms();
    Some(AbTest {
        model_name: model.name.clone(),
        current_version: current.version.to_string(),
        previous_version: previous.version.to_string(),
        current_performance: current.performance,
        previous_performance: previous.performance,
        started_at: now,
        ends_at: now + TEST_DURATION_SECS * 1000,
    })
}

/// Two-sample comparison of `current_performance` vs. `previous_performance`.
/// The winning arm must exceed the other by at least `performance_threshold`
/// (default 0.05); otherwise no winner and no deployment suggestion —
/// this is the implementer's resolution of the open "winner selection"
/// question in §9 (no `rand`-based coin flip).
pub fn select_winner(test: &AbTest, performance_threshold: f64) -> AbTestOutcome {
    let improvement = test.current_performance - test.previous_performance;
    let winner = if improvement >= performance_threshold {
        AbTestWinner::Current
    } else if -improvement >= performance_threshold {
        AbTestWinner::Previous
    } else {
        AbTestWinner::NoWinner
    };
    AbTestOutcome {
        model_name: test.model_name.clone(),
        winner,
        improvement,
        suggest_deployment: matches!(winner, AbTestWinner::Current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeploymentEvent, DeploymentRecord, ModelHealth, ModelStatus, ModelType, Version};
    use std::collections::HashMap;

    fn model_with_history(versions: &[(u32, f64)]) -> Model {
        Model {
            name: "m".to_string(),
            r#type: ModelType::Generic,
            version: Version::new(1, 0, versions.len() as u32 - 1),
            status: ModelStatus::Active,
            components: vec![],
            current_performance: versions.last().unwrap().1,
            metrics: HashMap::new(),
            health: ModelHealth { healthy: true, last_checked: 0, issues: vec![] },
            deployment_history: versions
                .iter()
                .map(|(patch, perf)| DeploymentRecord {
                    version: Version::new(1, 0, *patch),
                    performance: *perf,
                    timestamp: 0,
                    event: DeploymentEvent::ModelDeployed,
                })
                .collect(),
            backups: vec![],
            last_updated: 0,
        }
    }

    #[test]
    fn single_version_is_skipped() {
        let model = model_with_history(&[(0, 0.8)]);
        assert!(enroll(&model).is_none());
    }

    #[test]
    fn winner_needs_threshold_edge() {
        let model = model_with_history(&[(0, 0.80), (1, 0.86)]);
        let test = enroll(&model).unwrap();
        let outcome = select_winner(&test, 0.05);
        assert_eq!(outcome.winner, AbTestWinner::Current);
        assert!(outcome.suggest_deployment);
    }

    #[test]
    fn close_performance_has_no_winner() {
        let model = model_with_history(&[(0, 0.80), (1, 0.81)]);
        let test = enroll(&model).unwrap();
        let outcome = select_winner(&test, 0.05);
        assert_eq!(outcome.winner, AbTestWinner::NoWinner);
        assert!(!outcome.suggest_deployment);
    }
}
