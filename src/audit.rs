//! Bounded, non-blocking audit event channel
//!
//! Every evaluated decision for a governed agent produces exactly one
//! `DecisionRecord`. Records flow through a bounded channel to a consumer
//! outside the enforcement path. The emit side never blocks and never fails
//! loudly: a full queue silently drops the record, because stalling here
//! would stall the operation being vetted. Drops are counted for
//! observability but the count is not part of the decision contract.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::Verdict;
use crate::policy::RESOURCE_KEY_LEN;

/// Reference audit buffer sizing: 256 KiB of serialized records.
pub const AUDIT_BUFFER_BYTES: usize = 256 * 1024;

/// One evaluated decision, immutable once emitted.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub pid: u32,
    pub uid: u32,
    /// Resource identifier, zero-padded and safely truncated to the fixed
    /// maximum. All zeros when the identifier could not be resolved.
    pub resource: [u8; RESOURCE_KEY_LEN],
    pub verdict: Verdict,
    /// Monotonic clock, nanosecond resolution.
    pub timestamp_ns: u64,
}

impl DecisionRecord {
    /// Resource identifier as a lossy string, trimming zero padding.
    pub fn resource_str(&self) -> String {
        let end = self
            .resource
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(RESOURCE_KEY_LEN);
        String::from_utf8_lossy(&self.resource[..end]).into_owned()
    }
}

/// Producer half of the audit channel, cloned into every emitter.
#[derive(Clone)]
pub struct AuditEmitter {
    tx: mpsc::Sender<DecisionRecord>,
    dropped: Arc<AtomicU64>,
}

impl AuditEmitter {
    /// Publish a record, best-effort. Never blocks; a full or closed
    /// channel drops the record and bumps the drop counter.
    pub fn emit(&self, record: DecisionRecord) {
        if self.tx.try_send(record).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of records dropped since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create the audit channel, sized so `capacity_bytes` of records fit in
/// flight. The receiver belongs to the external consumer, which drains at
/// its own pace; there is no flow-control signal back to producers.
pub fn audit_channel(capacity_bytes: usize) -> (AuditEmitter, mpsc::Receiver<DecisionRecord>) {
    let capacity = (capacity_bytes / std::mem::size_of::<DecisionRecord>()).max(1);
    let (tx, rx) = mpsc::channel(capacity);
    (
        AuditEmitter {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

/// Nanoseconds from the monotonic clock, the timestamp domain of every
/// audit record.
pub fn monotonic_ns() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: clock_gettime writes the out-param and CLOCK_MONOTONIC is
    // always available on Linux.
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pid: u32) -> DecisionRecord {
        let mut resource = [0u8; RESOURCE_KEY_LEN];
        resource[..6].copy_from_slice(b"/tmp/x");
        DecisionRecord {
            pid,
            uid: 1000,
            resource,
            verdict: Verdict::Block,
            timestamp_ns: monotonic_ns(),
        }
    }

    #[test]
    fn test_emit_and_drain() {
        let (emitter, mut rx) = audit_channel(AUDIT_BUFFER_BYTES);
        emitter.emit(record(42));

        let got = rx.try_recv().unwrap();
        assert_eq!(got.pid, 42);
        assert_eq!(got.resource_str(), "/tmp/x");
        assert_eq!(emitter.dropped(), 0);
    }

    #[test]
    fn test_full_channel_drops_silently() {
        // Capacity of exactly one record
        let (emitter, mut rx) = audit_channel(std::mem::size_of::<DecisionRecord>());
        emitter.emit(record(1));
        emitter.emit(record(2));
        emitter.emit(record(3));

        assert_eq!(emitter.dropped(), 2);
        assert_eq!(rx.try_recv().unwrap().pid, 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_does_not_panic() {
        let (emitter, rx) = audit_channel(AUDIT_BUFFER_BYTES);
        drop(rx);
        emitter.emit(record(1));
        assert_eq!(emitter.dropped(), 1);
    }

    #[test]
    fn test_capacity_never_zero() {
        let (emitter, mut rx) = audit_channel(1);
        emitter.emit(record(9));
        assert_eq!(rx.try_recv().unwrap().pid, 9);
    }

    #[test]
    fn test_monotonic_timestamps() {
        let a = monotonic_ns();
        let b = monotonic_ns();
        assert!(b >= a);
    }
}
