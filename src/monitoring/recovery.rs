//! Auto-recovery procedures (§4.6, §9). The source's placeholder
//! recovery "success rates" are not ported — every procedure here
//! returns one of a fixed set of typed outcomes, never a sampled
//! probability.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOutcome {
    Recovered,
    StillDegraded,
    /// No recovery procedure is defined for this component prefix.
    NotApplicable,
}

/// Which named procedure applies to an incident's `component` prefix.
/// Component names are expected to look like `kafka_consumer`,
/// `rl_buffer`, `worker_pool_3` — the prefix before the first
/// underscore selects the procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procedure {
    BusReconnect,
    RlFlushRequeue,
    WorkerPoolRestart,
    Unknown,
}

pub fn procedure_for(component: &str) -> Procedure {
    let prefix = component.split('_').next().unwrap_or(component);
    match prefix {
        "kafka" | "amqp" | "bus" => Procedure::BusReconnect,
        "rl" | "experience" => Procedure::RlFlushRequeue,
        "worker" | "pipeline" => Procedure::WorkerPoolRestart,
        _ => Procedure::Unknown,
    }
}

/// Deterministic recovery verdict: a procedure either observably fixed
/// the condition it targets or it didn't. `condition_cleared` is
/// supplied by the caller from the actual post-procedure state (bus
/// connectivity, buffer occupancy, ...), never sampled.
pub fn outcome_for(procedure: Procedure, condition_cleared: bool) -> RecoveryOutcome {
    match procedure {
        Procedure::Unknown => RecoveryOutcome::NotApplicable,
        _ if condition_cleared => RecoveryOutcome::Recovered,
        _ => RecoveryOutcome::StillDegraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kafka_prefixed_component_maps_to_bus_reconnect() {
        assert_eq!(procedure_for("kafka_consumer_1"), Procedure::BusReconnect);
    }

    #[test]
    fn unknown_component_has_no_procedure() {
        assert_eq!(procedure_for("dashboard_widget"), Procedure::Unknown);
    }

    #[test]
    fn unknown_procedure_is_never_applicable() {
        assert_eq!(outcome_for(Procedure::Unknown, true), RecoveryOutcome::NotApplicable);
    }

    #[test]
    fn cleared_condition_recovers() {
        assert_eq!(outcome_for(Procedure::BusReconnect, true), RecoveryOutcome::Recovered);
        assert_eq!(outcome_for(Procedure::BusReconnect, false), RecoveryOutcome::StillDegraded);
    }
}
