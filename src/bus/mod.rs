//! Bus Adapter (C1)
//!
//! A uniform async publish/subscribe contract over two heterogeneous
//! backends. The real Kafka-like and AMQP-like clients are out of
//! scope (§1); this module ships two in-process stand-ins —
//! [`topic::TopicBus`] and [`queue::QueueBus`] — that preserve the
//! semantics a real client would expose (multi-consumer broadcast vs.
//! durable single-consumer queue) so the adapter, routing table, and
//! reconnect/backoff logic are all exercised honestly.

mod adapter;
mod queue;
mod routing;
mod topic;

pub use adapter::BusAdapter;
pub use routing::{Backend, ROUTES};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{BusError, Result};

/// A durable subscription handle. Dropping it — or calling
/// [`Subscription::cancel`] — stops delivery.
pub struct Subscription {
    cancel_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl Subscription {
    pub(crate) fn new(cancel_tx: tokio::sync::oneshot::Sender<()>) -> Self {
        Self {
            cancel_tx: Some(cancel_tx),
        }
    }

    pub fn cancel(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Abstract contract every bus backend implements. The coordinator
/// never depends on a concrete broker type, only on this trait.
#[async_trait]
pub trait Bus: Send + Sync {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<()>;

    /// Registers a durable consumer for `channel`. Messages are handed
    /// to the caller through the returned receiver; delivery is
    /// at-least-once and ordering within one channel is preserved.
    async fn subscribe(&self, channel: &str) -> Result<mpsc::Receiver<serde_json::Value>>;

    fn connected(&self) -> bool;
}

/// Status snapshot returned by `BusAdapter::health`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthStatus {
    pub kafka_connected: bool,
    pub amqp_connected: bool,
    pub last_error: Option<String>,
}

pub(crate) fn unavailable(channel: &str, reason: impl Into<String>) -> BusError {
    BusError::Unavailable {
        channel: channel.to_string(),
        reason: reason.into(),
    }
}
