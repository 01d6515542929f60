//! VetoGate - pre-execution allow/block enforcement for governed agent processes
//!
//! This library vets process-execution and file-open attempts before they take
//! effect: a hook adapter hands the decision engine an intercepted operation,
//! the engine consults a dynamically updatable whitelist, and the verdict is
//! returned before the underlying privileged action is allowed to proceed.
//! Processes not registered as agents bypass evaluation entirely.
//!
//! # Modules
//!
//! - `engine` - the decision engine (`evaluate` an operation to a verdict)
//! - `policy` - agent registry, path/hash whitelist, and key resolution
//! - `stats` - atomic check/block/allow counters
//! - `audit` - bounded, non-blocking audit event channel
//! - `hooks` - adapters from raw interception events to engine operations
//! - `burst` - traffic-rate anomaly sensor (independent of the engine)
//! - `enforcer` - eBPF LSM enforcement (optional, requires `--features ebpf`)
//! - `metrics` - Prometheus metrics for observability
//! - `config` - daemon configuration and policy seeding
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use vetogate::{audit_channel, CounterSet, DecisionEngine, InterceptedOperation,
//!                OperationKind, PathResolver, PolicyStore, ResourceKey, Verdict};
//!
//! let policy = Arc::new(PolicyStore::with_defaults());
//! let counters = Arc::new(CounterSet::new());
//! let (emitter, _events) = audit_channel(vetogate::audit::AUDIT_BUFFER_BYTES);
//! let engine = DecisionEngine::new(policy.clone(), counters, Arc::new(PathResolver), emitter);
//!
//! policy.register_agent(42).unwrap();
//! let key = ResourceKey::new(b"/usr/bin/ls").unwrap();
//! policy.set_policy(key, Verdict::Allow).unwrap();
//!
//! let op = InterceptedOperation {
//!     pid: 42,
//!     uid: 1000,
//!     kind: OperationKind::Execute,
//!     path: b"/usr/bin/ls",
//!     content_hash: None,
//! };
//! assert_eq!(engine.evaluate(&op), Verdict::Allow);
//! ```

pub mod audit;
pub mod burst;
pub mod config;
pub mod enforcer;
pub mod engine;
pub mod hooks;
pub mod logging;
pub mod metrics;
pub mod policy;
pub mod stats;

// Re-export commonly used types at crate root for convenience
pub use audit::{audit_channel, AuditEmitter, DecisionRecord};
pub use burst::{BurstEvent, BurstSensor, BurstSeverity, BurstThresholds};
pub use config::{GuardConfig, KeyStrategy};
pub use engine::{DecisionEngine, InterceptedOperation, OperationKind, Verdict};
pub use hooks::{ExecHook, OpenHook, RawEvent};
pub use policy::{
    HashResolver, KeyResolver, PathResolver, PolicyError, PolicyStore, ResolveError, ResourceKey,
};
pub use stats::{CounterSet, CounterSnapshot};
