use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::types::{now_ms, AngelInsight, LearningEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub count: usize,
    pub success_rate: f64,
    pub avg_processing_time: f64,
    pub top_domains: Vec<(String, usize)>,
    pub insight_excerpts: Vec<AngelInsight>,
}

pub fn daily_summary(
    events: &VecDeque<LearningEvent>,
    insights: &[AngelInsight],
    angel: Option<&str>,
    domain: Option<&str>,
) -> DailySummary {
    let filtered: Vec<&LearningEvent> = events
        .iter()
        .filter(|e| angel.map_or(true, |a| a == e.angel))
        .filter(|e| domain.map_or(true, |d| d == e.domain))
        .collect();

    let count = filtered.len();
    if count == 0 {
        return DailySummary {
            count: 0,
            success_rate: 0.0,
            avg_processing_time: 0.0,
            top_domains: Vec::new(),
            insight_excerpts: Vec::new(),
        };
    }

    let successes = filtered
        .iter()
        .filter(|e| e.output.success == Some(true))
        .count();
    let success_rate = 100.0 * successes as f64 / count as f64;

    let total_processing_time: f64 = filtered
        .iter()
        .filter_map(|e| e.metrics.get("processingTime"))
        .sum();
    let processing_samples = filtered
        .iter()
        .filter(|e| e.metrics.contains_key("processingTime"))
        .count()
        .max(1);
    let avg_processing_time = total_processing_time / processing_samples as f64;

    let mut domain_counts: HashMap<&str, usize> = HashMap::new();
    for e in &filtered {
        *domain_counts.entry(e.domain.as_str()).or_insert(0) += 1;
    }
    let mut top_domains: Vec<(String, usize)> = domain_counts
        .into_iter()
        .map(|(d, c)| (d.to_string(), c))
        .collect();
    top_domains.sort_by(|a, b| b.1.cmp(&a.1));

    DailySummary {
        count,
        success_rate,
        avg_processing_time,
        top_domains,
        insight_excerpts: insights.iter().rev().take(10).cloned().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    OneHour,
    SixHours,
    TwentyFourHours,
    SevenDays,
}

impl Period {
    fn secs(self) -> i64 {
        match self {
            Self::OneHour => 3600,
            Self::SixHours => 6 * 3600,
            Self::TwentyFourHours => 24 * 3600,
            Self::SevenDays => 7 * 24 * 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub period: Period,
    pub domain_distribution: HashMap<String, usize>,
    pub producer_performance: HashMap<String, f64>,
    pub hourly_histogram: Vec<usize>,
    pub daily_histogram: Vec<usize>,
    pub trend: TrendDirection,
}

/// Aggregates the requested window: domain distribution, per-producer
/// success rate, 24h/7d temporal histograms, and a trend computed by
/// comparing the most recent hour against the daily average.
pub fn analytics_snapshot(events: &VecDeque<LearningEvent>, period: Period) -> AnalyticsSnapshot {
    let now = now_ms();
    let window_start = now - period.secs() * 1000;
    let windowed: Vec<&LearningEvent> = events.iter().filter(|e| e.timestamp >= window_start).collect();

    let mut domain_distribution: HashMap<String, usize> = HashMap::new();
    let mut producer_success: HashMap<String, (usize, usize)> = HashMap::new();
    for e in &windowed {
        *domain_distribution.entry(e.domain.clone()).or_insert(0) += 1;
        let entry = producer_success.entry(e.angel.clone()).or_insert((0, 0));
        entry.1 += 1;
        if e.output.success == Some(true) {
            entry.0 += 1;
        }
    }
    let producer_performance: HashMap<String, f64> = producer_success
        .into_iter()
        .map(|(angel, (ok, total))| {
            let rate = if total == 0 { 0.0 } else { ok as f64 / total as f64 };
            (angel, rate)
        })
        .collect();

    let day_start = now - 24 * 3600 * 1000;
    let week_start = now - 7 * 24 * 3600 * 1000;
    let mut hourly_histogram = vec![0usize; 24];
    for e in events.iter().filter(|e| e.timestamp >= day_start) {
        let age_ms = now - e.timestamp;
        let bucket = (age_ms / (3600 * 1000)).clamp(0, 23) as usize;
        hourly_histogram[23 - bucket] += 1;
    }
    let mut daily_histogram = vec![0usize; 7];
    for e in events.iter().filter(|e| e.timestamp >= week_start) {
        let age_ms = now - e.timestamp;
        let bucket = (age_ms / (24 * 3600 * 1000)).clamp(0, 6) as usize;
        daily_histogram[6 - bucket] += 1;
    }

    let recent_hour_count = events.iter().filter(|e| e.timestamp >= now - 3600 * 1000).count();
    let daily_average = daily_histogram.iter().sum::<usize>() as f64 / 7.0;
    let trend = if daily_average <= 0.0 {
        TrendDirection::Stable
    } else if recent_hour_count as f64 > daily_average * 1.1 {
        TrendDirection::Increasing
    } else if (recent_hour_count as f64) < daily_average * 0.9 {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    AnalyticsSnapshot {
        period,
        domain_distribution,
        producer_performance,
        hourly_histogram,
        daily_histogram,
        trend,
    }
}
