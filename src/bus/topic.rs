use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};

use super::Bus;
use crate::error::Result;

/// Kafka-like stand-in: a broadcast channel per logical channel name.
/// Every subscriber sees every message published after it subscribed;
/// ordering is preserved per channel, lagging subscribers drop the
/// oldest unseen messages (mirrors a topic with a bounded retention
/// window rather than blocking the publisher).
pub struct TopicBus {
    channels: DashMap<String, broadcast::Sender<serde_json::Value>>,
    connected: AtomicBool,
    capacity: usize,
}

impl TopicBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            connected: AtomicBool::new(true),
            capacity,
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<serde_json::Value> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl Bus for TopicBus {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<()> {
        if !self.connected() {
            return Err(super::unavailable(channel, "topic backend disconnected").into());
        }
        // A send with no receivers is not an error for a topic: nobody
        // has to be listening for publish to succeed.
        let _ = self.sender(channel).send(payload);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<mpsc::Receiver<serde_json::Value>> {
        if !self.connected() {
            return Err(super::unavailable(channel, "topic backend disconnected").into());
        }
        let mut rx = self.sender(channel).subscribe();
        let (tx, out_rx) = mpsc::channel(self.capacity);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(value) => {
                        if tx.send(value).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "topic subscriber lagged, messages dropped");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(out_rx)
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_all_subscribers() {
        let bus = TopicBus::new(16);
        let mut a = bus.subscribe("omni.workflows").await.unwrap();
        let mut b = bus.subscribe("omni.workflows").await.unwrap();
        bus.publish("omni.workflows", serde_json::json!({"type": "ping"}))
            .await
            .unwrap();
        assert_eq!(a.recv().await.unwrap()["type"], "ping");
        assert_eq!(b.recv().await.unwrap()["type"], "ping");
    }

    #[tokio::test]
    async fn publish_while_disconnected_fails() {
        let bus = TopicBus::new(16);
        bus.set_connected(false);
        let err = bus
            .publish("omni.workflows", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BusUnavailable);
    }
}
