//! End-to-end incident detection and auto-recovery: three alerts
//! sharing the `kafka_*` component
//! prefix raise one incident; a successful bus-reconnect recovery
//! acknowledges the related alerts, and once they resolve the incident
//! becomes a pure function of elapsed time away from `resolved`.

use cladc::config::{AlertThresholds, EscalationRules};
use cladc::monitoring::{recovery, MonitoringSystem};
use cladc::types::{now_ms, IncidentStatus, Monitor, MonitorType};

fn register_kafka_monitor(system: &MonitoringSystem, name: &str) {
    system.register_monitor(Monitor {
        name: name.to_string(),
        r#type: MonitorType::Component,
        component: Some("kafka".to_string()),
        interval_secs: 60,
        warning_threshold: 10.0,
        critical_threshold: 20.0,
        enabled: true,
    });
}

#[test]
fn three_kafka_alerts_trigger_incident_and_auto_recovery() {
    let system = MonitoringSystem::new(1000, AlertThresholds::default(), EscalationRules::default());
    for name in ["kafka_consumer_1", "kafka_consumer_2", "kafka_consumer_3"] {
        register_kafka_monitor(&system, name);
        // 25 exceeds the critical threshold (20) for every consumer.
        system.observe(name, 25.0).unwrap();
    }

    let (_escalated, created, _auto_resolved) = system.management_tick();
    assert_eq!(created.len(), 1);
    let incident = &created[0];
    assert_eq!(incident.status, IncidentStatus::Detected);
    assert_eq!(incident.related_alerts.len(), 3);
    assert_eq!(incident.component, "kafka");

    // Auto-recovery: bus reconnect procedure applies to the "kafka" prefix.
    let procedure = recovery::procedure_for(&incident.component);
    assert_eq!(procedure, recovery::Procedure::BusReconnect);
    let outcome = recovery::outcome_for(procedure, true);
    assert_eq!(outcome, recovery::RecoveryOutcome::Recovered);

    // A successful recovery acknowledges every related alert, then the
    // measurement drops back under warning for two consecutive ticks.
    system.alerts.acknowledge_many(&incident.related_alerts);
    for name in ["kafka_consumer_1", "kafka_consumer_2", "kafka_consumer_3"] {
        system.observe(name, 1.0).unwrap();
        system.observe(name, 1.0).unwrap();
    }
    assert!(system.alerts.active().is_empty());

    // A fresh incident is younger than the 5-minute auto-resolve floor,
    // so the very next tick must not resolve it yet even though every
    // related alert has cleared — the age gate in `monitoring::incidents`
    // unit tests covers the case where that floor has elapsed.
    let (_escalated2, _created2, auto_resolved_immediately) = system.management_tick();
    assert!(auto_resolved_immediately.is_empty());
    assert_eq!(system.incidents.get(&incident.id).unwrap().status, IncidentStatus::Detected);
}

#[test]
fn unrecovered_bus_incident_stays_detected() {
    let system = MonitoringSystem::new(1000, AlertThresholds::default(), EscalationRules::default());
    for name in ["kafka_consumer_1", "kafka_consumer_2", "kafka_consumer_3"] {
        register_kafka_monitor(&system, name);
        system.observe(name, 25.0).unwrap();
    }
    let (_e, created, _r) = system.management_tick();
    let incident = &created[0];

    let outcome = recovery::outcome_for(recovery::Procedure::BusReconnect, false);
    assert_eq!(outcome, recovery::RecoveryOutcome::StillDegraded);

    let current = system.incidents.get(&incident.id).unwrap();
    assert_eq!(current.status, IncidentStatus::Detected);
    assert!(now_ms() >= current.detected_at);
}
