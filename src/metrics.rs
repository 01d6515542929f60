//! Prometheus metrics for enforcement observability
//!
//! These gauges are fed from counter snapshots by the daemon's periodic
//! collect pass; nothing on the evaluation hot path touches the registry.

use lazy_static::lazy_static;
use prometheus::{register_gauge, Gauge};

lazy_static! {
    /// Decisions evaluated for governed agents.
    pub static ref GUARD_CHECKS: Gauge = register_gauge!(
        "vetogate_checks_total",
        "Decision evaluations performed for governed agents"
    ).expect("failed to register GUARD_CHECKS metric");

    /// Operations denied.
    pub static ref GUARD_BLOCKS: Gauge = register_gauge!(
        "vetogate_blocks_total",
        "Operations blocked by the decision engine"
    ).expect("failed to register GUARD_BLOCKS metric");

    /// Operations permitted.
    pub static ref GUARD_ALLOWS: Gauge = register_gauge!(
        "vetogate_allows_total",
        "Operations allowed by the decision engine"
    ).expect("failed to register GUARD_ALLOWS metric");

    /// Audit records dropped under backpressure.
    pub static ref AUDIT_DROPPED: Gauge = register_gauge!(
        "vetogate_audit_dropped_total",
        "Audit records dropped because the event channel was full"
    ).expect("failed to register AUDIT_DROPPED metric");

    /// Governed agents currently registered.
    pub static ref REGISTERED_AGENTS: Gauge = register_gauge!(
        "vetogate_registered_agents",
        "Process ids currently registered as governed agents"
    ).expect("failed to register REGISTERED_AGENTS metric");

    /// Whitelist occupancy.
    pub static ref WHITELIST_ENTRIES: Gauge = register_gauge!(
        "vetogate_whitelist_entries",
        "Entries currently present in the whitelist"
    ).expect("failed to register WHITELIST_ENTRIES metric");

    /// Whether in-kernel enforcement is attached (1) or not (0).
    pub static ref ENFORCEMENT_ENABLED: Gauge = register_gauge!(
        "vetogate_enforcement_enabled",
        "Whether eBPF LSM enforcement is attached (1) or not (0)"
    ).expect("failed to register ENFORCEMENT_ENABLED metric");
}

/// Initialize metrics with default values.
///
/// Called during startup to ensure metrics exist in the registry.
pub fn init() {
    ENFORCEMENT_ENABLED.set(0.0);
    REGISTERED_AGENTS.set(0.0);
    WHITELIST_ENTRIES.set(0.0);
}

/// Mark in-kernel enforcement as attached in metrics.
pub fn set_enforcement(enabled: bool) {
    ENFORCEMENT_ENABLED.set(if enabled { 1.0 } else { 0.0 });
}

/// Copy a counter snapshot and drop count into the registry.
pub fn update_decisions(snapshot: &crate::stats::CounterSnapshot, audit_dropped: u64) {
    GUARD_CHECKS.set(snapshot.checks as f64);
    GUARD_BLOCKS.set(snapshot.blocks as f64);
    GUARD_ALLOWS.set(snapshot.allows as f64);
    AUDIT_DROPPED.set(audit_dropped as f64);
}

/// Update policy table occupancy.
pub fn update_policy(agents: usize, whitelist_entries: usize) {
    REGISTERED_AGENTS.set(agents as f64);
    WHITELIST_ENTRIES.set(whitelist_entries as f64);
}
