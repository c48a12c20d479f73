//! Experience Stream Buffer (C3)
//!
//! One ring buffer per algorithm tag. `enqueue` is cheap and
//! non-blocking, holding only its stream's lock; `flush_all` runs on a
//! single dedicated task and holds a flush lock that excludes
//! concurrent flushes without blocking concurrent `enqueue` calls.

mod buffer;

pub use buffer::FlushOutcome;

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::Mutex as AsyncMutex;

use crate::types::{Capability, Experience};

struct Stream {
    experiences: Vec<Experience>,
}

/// Experience buffer shared across the coordinator's ingestion path and
/// its periodic flush task.
pub struct ExperienceBuffer {
    streams: Mutex<HashMap<String, Stream>>,
    flush_lock: AsyncMutex<()>,
    max_buffer_size: usize,
    batch_size: usize,
    retry_counts: Mutex<HashMap<String, u32>>,
}

const MAX_FLUSH_RETRIES: u32 = 3;

impl ExperienceBuffer {
    pub fn new(max_buffer_size: usize, batch_size: usize) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            flush_lock: AsyncMutex::new(()),
            max_buffer_size,
            batch_size,
            retry_counts: Mutex::new(HashMap::new()),
        }
    }

    fn total_len(streams: &HashMap<String, Stream>) -> usize {
        streams.values().map(|s| s.experiences.len()).sum()
    }

    /// Enqueues one experience. On overflow the oldest experience is
    /// dropped, first from the target stream then (if still over
    /// budget) globally from the oldest stream with data.
    pub fn enqueue(&self, experience: Experience) {
        let mut streams = self.streams.lock().expect("lock poisoned");
        let stream = streams
            .entry(experience.algorithm.clone())
            .or_insert_with(|| Stream { experiences: Vec::new() });
        stream.experiences.push(experience);

        if Self::total_len(&streams) > self.max_buffer_size {
            if let Some(stream) = streams.values_mut().find(|s| !s.experiences.is_empty()) {
                stream.experiences.remove(0);
            }
        }
    }

    pub fn total_buffered(&self) -> usize {
        Self::total_len(&self.streams.lock().expect("lock poisoned"))
    }

    pub fn stream_len(&self, algorithm: &str) -> usize {
        self.streams
            .lock()
            .expect("lock poisoned")
            .get(algorithm)
            .map_or(0, |s| s.experiences.len())
    }

    /// Flushes every stream, batching at `batch_size` and invoking the
    /// capability once per batch. A batch that fails is retried on the
    /// next flush, up to 3 attempts total, then dropped.
    pub async fn flush_all(&self, capability: &dyn Capability) -> Vec<FlushOutcome> {
        let _guard = self.flush_lock.lock().await;
        let algorithms: Vec<String> = {
            let streams = self.streams.lock().expect("lock poisoned");
            streams.keys().cloned().collect()
        };

        let mut outcomes = Vec::new();
        for algorithm in algorithms {
            loop {
                let batch = {
                    let mut streams = self.streams.lock().expect("lock poisoned");
                    let Some(stream) = streams.get_mut(&algorithm) else {
                        break;
                    };
                    if stream.experiences.is_empty() {
                        break;
                    }
                    let take = self.batch_size.min(stream.experiences.len());
                    stream.experiences.drain(..take).collect::<Vec<_>>()
                };
                if batch.is_empty() {
                    break;
                }
                let batch_len = batch.len();
                let attempt = {
                    let counts = self.retry_counts.lock().expect("lock poisoned");
                    counts.get(&algorithm).copied().unwrap_or(0) + 1
                };
                let (outcome, failed_batch) =
                    buffer::flush_batch(&algorithm, batch, attempt, capability).await;

                if outcome.processed {
                    self.retry_counts.lock().expect("lock poisoned").remove(&algorithm);
                } else if attempt >= MAX_FLUSH_RETRIES {
                    self.retry_counts.lock().expect("lock poisoned").remove(&algorithm);
                    let mut dropped = outcome.clone();
                    dropped.dropped = true;
                    outcomes.push(dropped);
                    break;
                } else {
                    self.retry_counts
                        .lock()
                        .expect("lock poisoned")
                        .insert(algorithm.clone(), attempt);
                    // Put the failed batch back at the front of the
                    // stream so the next flush retries it first.
                    let mut streams = self.streams.lock().expect("lock poisoned");
                    if let Some(stream) = streams.get_mut(&algorithm) {
                        let mut restored = failed_batch;
                        restored.append(&mut stream.experiences);
                        stream.experiences = restored;
                    }
                    outcomes.push(outcome);
                    break;
                }

                outcomes.push(outcome);
                if batch_len < self.batch_size {
                    break;
                }
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CollectDataOutcome, InferOutcome, SmokeTestOutcome, TrainOutcome};
    use async_trait::async_trait;

    struct CountingCapability {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Capability for CountingCapability {
        async fn train(&self, _: &str, _: serde_json::Value) -> crate::error::Result<TrainOutcome> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(TrainOutcome {
                performance: 0.8,
                iterations: 1,
                converged: true,
                training_time_ms: 1,
            })
        }
        async fn infer(&self, _: &str, _: serde_json::Value) -> crate::error::Result<InferOutcome> {
            Ok(InferOutcome { action: serde_json::json!({}), confidence: None })
        }
        async fn collect_data(&self, _: &[String]) -> crate::error::Result<CollectDataOutcome> {
            Ok(CollectDataOutcome { records: 0, dataset: serde_json::json!({}) })
        }
        async fn smoke_test(&self, _: &str, _: &str) -> crate::error::Result<SmokeTestOutcome> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(SmokeTestOutcome { passed: 48, total: 50 })
        }
    }

    fn experience(algo: &str) -> Experience {
        Experience::new(algo, serde_json::json!({}), serde_json::json!({}), 1.0, serde_json::json!({}), 0)
    }

    #[test]
    fn enqueue_evicts_oldest_on_overflow() {
        let buf = ExperienceBuffer::new(2, 100);
        buf.enqueue(experience("q_learning"));
        buf.enqueue(experience("q_learning"));
        buf.enqueue(experience("q_learning"));
        assert_eq!(buf.total_buffered(), 2);
    }

    #[tokio::test]
    async fn flush_250_experiences_yields_three_batches() {
        let buf = ExperienceBuffer::new(10_000, 100);
        for _ in 0..250 {
            buf.enqueue(experience("q_learning"));
        }
        let capability = CountingCapability { calls: std::sync::atomic::AtomicUsize::new(0) };
        let outcomes = buf.flush_all(&capability).await;
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].batch_size, 100);
        assert_eq!(outcomes[1].batch_size, 100);
        assert_eq!(outcomes[2].batch_size, 50);
        assert_eq!(buf.total_buffered(), 0);
    }
}
