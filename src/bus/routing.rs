/// Which backend a logical channel is mapped to. `Topic` is the
/// broadcast-channel-backed, Kafka-like backend (every consumer sees
/// every message); `Queue` is the mpsc-backed, AMQP-like backend
/// (durable single consumer per queue, competing consumers share load).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Topic,
    Queue,
}

/// Static channel → backend routing table, per the external interface's
/// channel list (§6). High fan-out, coordinator-internal-to-external
/// emissions go to the topic backend; externally-consumed work items
/// that want durable single-consumer semantics go to the queue backend.
pub const ROUTES: &[(&str, Backend)] = &[
    ("omni.learning.events", Backend::Queue),
    ("omni.rl.experiences", Backend::Queue),
    ("omni.rl.rewards", Backend::Queue),
    ("omni.rl.actions", Backend::Topic),
    ("omni.rl.learning", Backend::Queue),
    ("omni.rl.inference", Backend::Queue),
    ("omni.model.updates", Backend::Topic),
    ("omni.workflows", Backend::Topic),
    ("omni.performance.metrics", Backend::Topic),
];

pub fn backend_for(channel: &str) -> Backend {
    ROUTES
        .iter()
        .find(|(name, _)| *name == channel)
        .map_or(Backend::Topic, |(_, backend)| *backend)
}
