use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use super::Bus;
use crate::error::Result;

/// AMQP-like stand-in: a durable mpsc queue per logical channel name.
/// Unlike the topic backend, a message is delivered to exactly one
/// consumer of the queue — competing consumers share load instead of
/// each seeing every message.
pub struct QueueBus {
    queues: DashMap<String, mpsc::Sender<serde_json::Value>>,
    capacity: usize,
    connected: AtomicBool,
}

impl QueueBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: DashMap::new(),
            capacity,
            connected: AtomicBool::new(true),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl Bus for QueueBus {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<()> {
        if !self.connected() {
            return Err(super::unavailable(channel, "queue backend disconnected").into());
        }
        let Some(sender) = self.queues.get(channel).map(|e| e.clone()) else {
            // No durable consumer registered yet for this queue; this is
            // not a delivery failure in an AMQP-like world (the queue
            // just has nobody bound), so the message is dropped.
            tracing::warn!(channel, "publish to queue with no consumer, dropping");
            return Ok(());
        };
        sender
            .send(payload)
            .await
            .map_err(|_| super::unavailable(channel, "consumer channel closed").into())
    }

    async fn subscribe(&self, channel: &str) -> Result<mpsc::Receiver<serde_json::Value>> {
        if !self.connected() {
            return Err(super::unavailable(channel, "queue backend disconnected").into());
        }
        let (tx, rx) = mpsc::channel(self.capacity);
        self.queues.insert(channel.to_string(), tx);
        Ok(rx)
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_delivers_to_registered_consumer() {
        let bus = QueueBus::new(16);
        let mut rx = bus.subscribe("omni.learning.events").await.unwrap();
        bus.publish("omni.learning.events", serde_json::json!({"id": "e1"}))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap()["id"], "e1");
    }

    #[tokio::test]
    async fn publish_without_consumer_is_dropped_not_errored() {
        let bus = QueueBus::new(16);
        bus.publish("omni.learning.events", serde_json::json!({}))
            .await
            .unwrap();
    }
}
