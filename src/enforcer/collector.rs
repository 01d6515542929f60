//! Userspace collector for kernel audit events
//!
//! Reads decision events from the EVENTS ring buffer and republishes them
//! as `DecisionRecord`s on the shared audit channel. Runs as a background
//! task; the kernel side never waits for it.

use aya::maps::RingBuf;
use aya::Bpf;
use std::sync::Arc;
use tokio::io::unix::AsyncFd;
use tokio::sync::RwLock;

use super::EnforcerError;
use crate::audit::{AuditEmitter, DecisionRecord};
use crate::engine::Verdict;
use crate::policy::RESOURCE_KEY_LEN;

/// Decision event from the kernel (must match the eBPF struct layout).
#[repr(C)]
#[derive(Clone, Copy)]
struct KernelEvent {
    pid: u32,
    uid: u32,
    resource: [u8; RESOURCE_KEY_LEN],
    verdict: u8,
    _pad: [u8; 7],
    timestamp_ns: u64,
}

impl KernelEvent {
    fn into_record(self) -> DecisionRecord {
        DecisionRecord {
            pid: self.pid,
            uid: self.uid,
            resource: self.resource,
            verdict: if self.verdict == 1 {
                Verdict::Allow
            } else {
                Verdict::Block
            },
            timestamp_ns: self.timestamp_ns,
        }
    }
}

/// Drain the EVENTS ring buffer until the task is cancelled.
pub async fn run_collector(
    bpf: Arc<RwLock<Bpf>>,
    audit: AuditEmitter,
) -> Result<(), EnforcerError> {
    let ring: RingBuf<_> = {
        let mut bpf = bpf.write().await;
        bpf.take_map("EVENTS")
            .ok_or_else(|| EnforcerError::MapError("EVENTS map not found".to_string()))?
            .try_into()
            .map_err(|e: aya::maps::MapError| EnforcerError::MapError(e.to_string()))?
    };

    let mut fd = AsyncFd::new(ring)
        .map_err(|e| EnforcerError::MapError(format!("ring buffer fd: {}", e)))?;

    loop {
        let mut guard = fd
            .readable_mut()
            .await
            .map_err(|e| EnforcerError::MapError(format!("ring buffer poll: {}", e)))?;

        let ring = guard.get_inner_mut();
        while let Some(item) = ring.next() {
            if item.len() >= std::mem::size_of::<KernelEvent>() {
                // SAFETY: the kernel program submits exactly one packed
                // KernelEvent per ring entry; size is checked above.
                let event =
                    unsafe { std::ptr::read_unaligned(item.as_ptr() as *const KernelEvent) };
                audit.emit(event.into_record());
            }
        }
        guard.clear_ready();
    }
}
