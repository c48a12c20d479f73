use serde::{Deserialize, Serialize};

use crate::types::{Capability, Experience};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushOutcome {
    pub algorithm: String,
    pub batch_size: usize,
    pub processed: bool,
    pub attempt: u32,
    pub dropped: bool,
}

/// Invokes the capability once for one batch. Retry bookkeeping across
/// flush intervals lives in `ExperienceBuffer::flush_all`, which is what
/// "retained for the next flush, up to 3 retries" (§4.3) actually means
/// — a failure here does not retry synchronously within the same call.
pub async fn flush_batch(
    algorithm: &str,
    mut batch: Vec<Experience>,
    attempt: u32,
    capability: &dyn Capability,
) -> (FlushOutcome, Vec<Experience>) {
    let batch_size = batch.len();
    let payload = serde_json::json!({
        "algorithm": algorithm,
        "experiences": batch,
    });

    match capability.train(algorithm, payload).await {
        Ok(_) => {
            for exp in &mut batch {
                exp.processed = true;
            }
            (
                FlushOutcome {
                    algorithm: algorithm.to_string(),
                    batch_size,
                    processed: true,
                    attempt,
                    dropped: false,
                },
                Vec::new(),
            )
        }
        Err(e) => {
            tracing::warn!(algorithm, attempt, error = %e, "experience batch flush failed");
            (
                FlushOutcome {
                    algorithm: algorithm.to_string(),
                    batch_size,
                    processed: false,
                    attempt,
                    dropped: false,
                },
                batch,
            )
        }
    }
}
