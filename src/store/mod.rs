//! Event Store (C2) — "Angel" store
//!
//! An append-only learning-event log with derived rollups: daily
//! summaries, multi-window analytics, and pattern mining that attaches
//! `AngelInsight` records back onto the contributing events.

mod analytics;
mod patterns;

pub use analytics::{AnalyticsSnapshot, DailySummary, Period, TrendDirection};
pub use patterns::PatternClassification;

use std::collections::VecDeque;
use std::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::types::{now_ms, AngelInsight, LearningEvent, Timestamp};

pub struct EventQuery {
    pub angel: Option<String>,
    pub domain: Option<String>,
    pub since: Option<Timestamp>,
    pub limit: Option<usize>,
}

/// Single-writer-for-append, concurrent-readers event store. Appends
/// and the periodic analytics recomputation are the only two writers;
/// every other operation only reads.
pub struct EventStore {
    max_events: usize,
    events: RwLock<VecDeque<LearningEvent>>,
    insights: RwLock<Vec<AngelInsight>>,
    appends_since_snapshot: std::sync::atomic::AtomicU64,
}

impl EventStore {
    pub fn new(max_events: usize) -> Self {
        Self {
            max_events,
            events: RwLock::new(VecDeque::new()),
            insights: RwLock::new(Vec::new()),
            appends_since_snapshot: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn restore(max_events: usize, events: Vec<LearningEvent>, insights: Vec<AngelInsight>) -> Self {
        let store = Self::new(max_events);
        *store.events.write().expect("lock poisoned") = events.into();
        *store.insights.write().expect("lock poisoned") = insights;
        store
    }

    /// Appends an event, assigning an id if missing. Returns `true` when
    /// a snapshot should be triggered (every ~10th append), per the
    /// store's snapshot policy.
    pub fn append(&self, mut event: LearningEvent) -> Result<bool> {
        if event.id.is_empty() {
            event.id = uuid_like(event.timestamp);
        }
        let mut events = self.events.write().expect("lock poisoned");
        events.push_back(event);
        while events.len() > self.max_events {
            events.pop_front();
        }
        drop(events);

        let count = self
            .appends_since_snapshot
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        Ok(count % 10 == 0)
    }

    pub fn query(&self, q: &EventQuery) -> Vec<LearningEvent> {
        let events = self.events.read().expect("lock poisoned");
        let mut matched: Vec<LearningEvent> = events
            .iter()
            .filter(|e| q.angel.as_deref().map_or(true, |a| a == e.angel))
            .filter(|e| q.domain.as_deref().map_or(true, |d| d == e.domain))
            .filter(|e| q.since.map_or(true, |s| e.timestamp >= s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = q.limit {
            matched.truncate(limit);
        }
        matched
    }

    pub fn len(&self) -> usize {
        self.events.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn daily_summary(&self, angel: Option<&str>, domain: Option<&str>) -> DailySummary {
        let events = self.events.read().expect("lock poisoned");
        let insights = self.insights.read().expect("lock poisoned");
        analytics::daily_summary(&events, &insights, angel, domain)
    }

    pub fn analytics_snapshot(&self, period: Period) -> AnalyticsSnapshot {
        let events = self.events.read().expect("lock poisoned");
        analytics::analytics_snapshot(&events, period)
    }

    /// Clusters events by `(producer, domain, success)`, classifies each
    /// cluster, and attaches an `AngelInsight` to every contributing
    /// event. Returns the newly produced insights.
    pub fn pattern_analysis(&self) -> Vec<AngelInsight> {
        let events = self.events.read().expect("lock poisoned");
        let new_insights = patterns::analyze(&events);
        drop(events);
        let mut insights = self.insights.write().expect("lock poisoned");
        insights.extend(new_insights.clone());
        new_insights
    }

    pub fn insights(&self) -> Vec<AngelInsight> {
        self.insights.read().expect("lock poisoned").clone()
    }

    pub fn cleanup(&self, retention_secs: u64) -> usize {
        let cutoff = now_ms() - (retention_secs as i64 * 1000);
        let mut events = self.events.write().expect("lock poisoned");
        let before = events.len();
        events.retain(|e| e.timestamp >= cutoff);
        before - events.len()
    }

    pub fn snapshot_events(&self) -> Vec<LearningEvent> {
        self.events.read().expect("lock poisoned").iter().cloned().collect()
    }

    pub fn capacity_check(&self) -> Result<()> {
        if self.len() > self.max_events {
            return Err(StoreError::CapacityExceeded { max: self.max_events }.into());
        }
        Ok(())
    }
}

fn uuid_like(timestamp: Timestamp) -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("evt-{timestamp}-{seq}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventOutcome;
    use std::collections::HashMap;

    fn event(angel: &str, domain: &str, success: bool, processing_time: f64) -> LearningEvent {
        let mut metrics = HashMap::new();
        metrics.insert("processingTime".to_string(), processing_time);
        LearningEvent {
            id: String::new(),
            angel: angel.to_string(),
            domain: domain.to_string(),
            input: serde_json::json!({}),
            output: EventOutcome {
                payload: serde_json::json!({}),
                success: Some(success),
            },
            metrics,
            timestamp: now_ms(),
            correlation_id: None,
        }
    }

    #[test]
    fn append_assigns_id_and_evicts_fifo() {
        let store = EventStore::new(2);
        store.append(event("a", "traffic", true, 10.0)).unwrap();
        store.append(event("a", "traffic", true, 10.0)).unwrap();
        store.append(event("a", "traffic", true, 10.0)).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn daily_summary_matches_scenario_one() {
        let store = EventStore::new(1000);
        for _ in 0..5 {
            store
                .append(event("LearningAngel", "traffic", true, 100.0))
                .unwrap();
        }
        for _ in 0..5 {
            store
                .append(event("LearningAngel", "traffic", false, 300.0))
                .unwrap();
        }
        let summary = store.daily_summary(None, None);
        assert_eq!(summary.count, 10);
        assert!((summary.success_rate - 50.0).abs() < 1e-9);
        assert!((summary.avg_processing_time - 200.0).abs() < 1e-9);
        assert_eq!(summary.top_domains[0].0, "traffic");
        assert_eq!(summary.top_domains[0].1, 10);
    }

    #[test]
    fn empty_store_daily_summary_has_zero_count() {
        let store = EventStore::new(1000);
        let summary = store.daily_summary(None, None);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.success_rate, 0.0);
    }
}
