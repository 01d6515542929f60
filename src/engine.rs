//! The access-control decision engine
//!
//! `DecisionEngine::evaluate` is the single choke point every hook adapter
//! calls: given an intercepted operation it consults the policy store,
//! updates the counters, emits an audit record, and returns the verdict.
//! The caller's privileged action is suspended until the verdict returns,
//! so evaluation is synchronous, allocation-free on the fast path, and
//! bounded: two map lookups, atomic adds, one non-blocking channel write.
//!
//! ```text
//! Hook Adapter ──► evaluate(op)
//!                     │
//!          not an agent? ──► Allow (no counters, no audit)
//!                     │
//!              resolve key ──► whitelist lookup
//!                     │              │
//!                     │      Allow entry → Allow
//!                     │      Block entry, absent, unresolved → Block
//!                     │
//!          counters + audit record ──► Verdict
//! ```
//!
//! Fail-closed is the load-bearing invariant: a missing entry, a truncated
//! identifier, or any internal lookup failure resolves to `Block`, never to
//! `Allow`. There is no verdict caching - whitelist entries change between
//! calls and a stale answer would leak a permission.

use std::sync::Arc;

use crate::audit::{monotonic_ns, AuditEmitter, DecisionRecord};
use crate::policy::{KeyResolver, PolicyStore};
use crate::stats::{CounterSet, CounterSnapshot};

/// The binary outcome of a decision evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Block,
}

/// The kind of privileged operation being vetted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Execute a binary
    Execute,
    /// Open a file
    Open,
}

/// A platform-neutral descriptor of one intercepted operation.
///
/// Borrowed fields keep the hot path copy-free; the engine copies into the
/// fixed-size audit buffer only once a record is actually emitted.
#[derive(Debug, Clone, Copy)]
pub struct InterceptedOperation<'a> {
    pub pid: u32,
    pub uid: u32,
    pub kind: OperationKind,
    /// Raw resource identifier bytes as extracted, possibly empty.
    pub path: &'a [u8],
    /// Content digest of the resource, when the interception layer
    /// computed one (hash-keyed deployments).
    pub content_hash: Option<&'a [u8; 32]>,
}

/// The decision engine. One instance is shared by all hook adapters.
pub struct DecisionEngine {
    policy: Arc<PolicyStore>,
    counters: Arc<CounterSet>,
    resolver: Arc<dyn KeyResolver>,
    audit: AuditEmitter,
}

impl DecisionEngine {
    pub fn new(
        policy: Arc<PolicyStore>,
        counters: Arc<CounterSet>,
        resolver: Arc<dyn KeyResolver>,
        audit: AuditEmitter,
    ) -> Self {
        Self {
            policy,
            counters,
            resolver,
            audit,
        }
    }

    /// Evaluate one intercepted operation to a verdict.
    ///
    /// Ungoverned processes return `Allow` immediately: no whitelist
    /// lookup, no counter update, no audit record. For governed agents the
    /// whitelist is authoritative - only an explicit `Allow` entry for the
    /// resolved key permits the operation.
    pub fn evaluate(&self, op: &InterceptedOperation<'_>) -> Verdict {
        if !self.policy.is_agent(op.pid) {
            return Verdict::Allow;
        }

        let (verdict, resource) = match self.resolver.resolve(op) {
            Ok(key) => {
                let verdict = match self.policy.lookup(&key) {
                    Some(Verdict::Allow) => Verdict::Allow,
                    Some(Verdict::Block) | None => Verdict::Block,
                };
                (verdict, key.padded())
            }
            // Unresolved identifier: treated as any other whitelist miss
            Err(err) => (Verdict::Block, err.partial()),
        };

        self.counters.record(verdict);
        self.audit.emit(DecisionRecord {
            pid: op.pid,
            uid: op.uid,
            resource,
            verdict,
            timestamp_ns: monotonic_ns(),
        });

        verdict
    }

    /// Current counter values, for the control plane.
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Audit records dropped under backpressure since startup.
    pub fn audit_dropped(&self) -> u64 {
        self.audit.dropped()
    }

    /// The policy store this engine consults.
    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }
}
