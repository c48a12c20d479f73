//! Component registry (C8) — every subsystem advertises its status here
//! as it comes up. Backed by `dashmap` so the Control API's `status()`
//! reads concurrently with loop tasks updating their own entry, without
//! contending with each other: the one singleton the concurrency model
//! allows to stay mutable after startup.

use std::time::Instant;

use dashmap::DashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    Starting,
    Running,
    Degraded,
    Stopped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentStatus {
    pub state: ComponentState,
    pub detail: Option<String>,
}

pub struct ComponentRegistry {
    components: DashMap<String, ComponentStatus>,
    started_at: Instant,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            components: DashMap::new(),
            started_at: Instant::now(),
        }
    }

    pub fn set(&self, name: &str, state: ComponentState) {
        self.components.insert(
            name.to_string(),
            ComponentStatus { state, detail: None },
        );
    }

    pub fn set_degraded(&self, name: &str, detail: impl Into<String>) {
        self.components.insert(
            name.to_string(),
            ComponentStatus {
                state: ComponentState::Degraded,
                detail: Some(detail.into()),
            },
        );
    }

    pub fn snapshot(&self) -> std::collections::HashMap<String, ComponentStatus> {
        self.components
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
