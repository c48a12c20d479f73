use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::types::{now_ms, AngelInsight, InsightType, LearningEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternClassification {
    Emerging,
    Stable,
    Declining,
}

struct Cluster {
    key: (String, String, bool),
    event_ids: Vec<String>,
    timestamps: Vec<i64>,
}

/// Clusters events by `(producer, domain, success)`, keeps clusters with
/// more than one occurrence, and classifies each by how concentrated its
/// occurrences are within the last hour. Uses `rayon` to parallelize
/// clustering over large event windows.
pub fn analyze(events: &VecDeque<LearningEvent>) -> Vec<AngelInsight> {
    use rayon::prelude::*;

    let total = events.len();
    if total == 0 {
        return Vec::new();
    }

    let mut groups: HashMap<(String, String, bool), Cluster> = HashMap::new();
    for e in events {
        let success = e.output.success.unwrap_or(false);
        let key = (e.angel.clone(), e.domain.clone(), success);
        let cluster = groups.entry(key.clone()).or_insert_with(|| Cluster {
            key,
            event_ids: Vec::new(),
            timestamps: Vec::new(),
        });
        cluster.event_ids.push(e.id.clone());
        cluster.timestamps.push(e.timestamp);
    }

    let now = now_ms();
    let one_hour_ago = now - 3600 * 1000;

    groups
        .into_par_iter()
        .filter(|(_, cluster)| cluster.event_ids.len() > 1)
        .filter_map(|(key, cluster)| {
            let count = cluster.event_ids.len();
            let strength = count as f64 / total as f64;
            let recent = cluster
                .timestamps
                .iter()
                .filter(|&&t| t >= one_hour_ago)
                .count();
            let recent_fraction = recent as f64 / count as f64;

            let classification = if recent_fraction >= 0.70 {
                PatternClassification::Emerging
            } else if recent_fraction >= 0.30 {
                PatternClassification::Stable
            } else {
                PatternClassification::Declining
            };

            let insight_type = match classification {
                PatternClassification::Emerging => InsightType::EmergingPattern,
                PatternClassification::Stable => InsightType::StablePattern,
                PatternClassification::Declining => InsightType::DecliningPattern,
            };

            Some(AngelInsight {
                r#type: insight_type,
                pattern_key: format!("{}:{}:{}", key.0, key.1, key.2),
                significance: strength.min(1.0),
                timestamp: now,
                event_ids: cluster.event_ids,
            })
        })
        .collect()
}
