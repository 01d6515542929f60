//! Hook adapters: platform interception events to engine operations
//!
//! A hook adapter translates the raw fields of a platform-specific
//! interception event (execute-binary, open-file) into the generic
//! `InterceptedOperation` the decision engine consumes, and translates the
//! verdict back into the platform's accept/deny return contract: `0`
//! permits the operation, `-EACCES` denies it.
//!
//! Adapters are thin by design; extraction is defensive. Identifier bytes
//! are taken exactly as bounded by the source buffer (truncation to the
//! fixed key length happens at the resolution boundary, never by reading
//! out of bounds), and an extraction failure simply yields an empty
//! identifier, which the engine treats as any other Block-qualifying miss.
//!
//! A test harness is its own platform: build a `RawEvent` with synthetic
//! fields and feed it straight through either hook.

use crate::engine::{DecisionEngine, InterceptedOperation, OperationKind, Verdict};

/// Raw fields extracted from a platform interception event.
#[derive(Debug, Clone, Copy)]
pub struct RawEvent<'a> {
    pub pid: u32,
    pub uid: u32,
    /// Identifier bytes, exactly as bounded by the source buffer. Empty
    /// when extraction failed.
    pub path: &'a [u8],
    /// Content digest, when the platform computed one.
    pub content_hash: Option<&'a [u8; 32]>,
}

/// Translate a verdict into the platform return contract.
pub fn return_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Allow => 0,
        Verdict::Block => -libc::EACCES,
    }
}

/// Adapter for the execute-binary interception point.
pub struct ExecHook;

impl ExecHook {
    /// Vet one execution attempt; returns `0` to permit, `-EACCES` to deny.
    pub fn intercept(engine: &DecisionEngine, event: RawEvent<'_>) -> i32 {
        let op = InterceptedOperation {
            pid: event.pid,
            uid: event.uid,
            kind: OperationKind::Execute,
            path: event.path,
            content_hash: event.content_hash,
        };
        return_code(engine.evaluate(&op))
    }
}

/// Adapter for the open-file interception point.
pub struct OpenHook;

impl OpenHook {
    /// Vet one open attempt; returns `0` to permit, `-EACCES` to deny.
    pub fn intercept(engine: &DecisionEngine, event: RawEvent<'_>) -> i32 {
        let op = InterceptedOperation {
            pid: event.pid,
            uid: event.uid,
            kind: OperationKind::Open,
            path: event.path,
            content_hash: event.content_hash,
        };
        return_code(engine.evaluate(&op))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{audit_channel, AUDIT_BUFFER_BYTES};
    use crate::policy::{PathResolver, PolicyStore, ResourceKey};
    use crate::stats::CounterSet;
    use std::sync::Arc;

    fn engine() -> (DecisionEngine, Arc<PolicyStore>) {
        let policy = Arc::new(PolicyStore::with_defaults());
        let counters = Arc::new(CounterSet::new());
        let (emitter, _rx) = audit_channel(AUDIT_BUFFER_BYTES);
        let engine = DecisionEngine::new(
            Arc::clone(&policy),
            counters,
            Arc::new(PathResolver),
            emitter,
        );
        (engine, policy)
    }

    #[test]
    fn test_return_codes() {
        assert_eq!(return_code(Verdict::Allow), 0);
        assert_eq!(return_code(Verdict::Block), -13);
    }

    #[test]
    fn test_exec_hook_denies_unlisted_binary() {
        let (engine, policy) = engine();
        policy.register_agent(42).unwrap();

        let event = RawEvent {
            pid: 42,
            uid: 1000,
            path: b"/tmp/payload",
            content_hash: None,
        };
        assert_eq!(ExecHook::intercept(&engine, event), -libc::EACCES);
    }

    #[test]
    fn test_open_hook_permits_whitelisted_file() {
        let (engine, policy) = engine();
        policy.register_agent(42).unwrap();
        policy
            .set_policy(ResourceKey::new(b"/var/log/app.log").unwrap(), Verdict::Allow)
            .unwrap();

        let event = RawEvent {
            pid: 42,
            uid: 1000,
            path: b"/var/log/app.log",
            content_hash: None,
        };
        assert_eq!(OpenHook::intercept(&engine, event), 0);
    }

    #[test]
    fn test_extraction_failure_denies() {
        let (engine, policy) = engine();
        policy.register_agent(42).unwrap();

        let event = RawEvent {
            pid: 42,
            uid: 1000,
            path: b"",
            content_hash: None,
        };
        assert_eq!(OpenHook::intercept(&engine, event), -libc::EACCES);
    }

    #[test]
    fn test_ungoverned_process_passes_through() {
        let (engine, _policy) = engine();
        let event = RawEvent {
            pid: 7,
            uid: 1000,
            path: b"/tmp/anything",
            content_hash: None,
        };
        assert_eq!(ExecHook::intercept(&engine, event), 0);
        assert_eq!(engine.counters().checks, 0);
    }
}
