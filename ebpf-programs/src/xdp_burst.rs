//! eBPF XDP burst sensor
//!
//! Counts incoming packets per one-second window and publishes an event to
//! userspace whenever the rate crosses a severity threshold. Independent of
//! the LSM guard: separate maps, separate ring buffer, no shared state.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU64, Ordering};

use aya_ebpf::{
    bindings::xdp_action,
    helpers::bpf_ktime_get_ns,
    macros::{map, xdp},
    maps::{Array, PerCpuArray, RingBuf},
    programs::XdpContext,
};

/// Rate calculation window
const WINDOW_NS: u64 = 1_000_000_000;

// Packets-per-second thresholds per severity level
const THRESHOLD_LOW: u64 = 1_000;
const THRESHOLD_MEDIUM: u64 = 10_000;
const THRESHOLD_HIGH: u64 = 50_000;
const THRESHOLD_CRITICAL: u64 = 100_000;

/// Per-CPU packet counter
#[map]
static PKT_COUNT: PerCpuArray<u64> = PerCpuArray::with_max_entries(1, 0);

/// Timestamp of the last window rollover
#[map]
static LAST_CHECK: Array<u64> = Array::with_max_entries(1, 0);

/// Ring buffer for burst events to userspace
#[map]
static BURST_EVENTS: RingBuf = RingBuf::with_byte_size(256 * 1024, 0);

/// Burst event published per anomalous window.
#[repr(C)]
struct BurstEvent {
    timestamp_ns: u64,
    pps: u64,
    severity: u32,
    _pad: u32,
}

#[xdp]
pub fn detect_burst(_ctx: XdpContext) -> u32 {
    let now = unsafe { bpf_ktime_get_ns() };

    let count = match PKT_COUNT.get_ptr_mut(0) {
        Some(count) => count,
        None => return xdp_action::XDP_PASS,
    };
    unsafe { *count += 1 };

    let last = match LAST_CHECK.get_ptr_mut(0) {
        Some(last) => last,
        None => return xdp_action::XDP_PASS,
    };

    let start = unsafe { (*(last as *mut AtomicU64)).load(Ordering::Relaxed) };
    let elapsed = now.wrapping_sub(start);
    if elapsed < WINDOW_NS {
        return xdp_action::XDP_PASS;
    }

    // One CPU wins the rollover for this window
    if unsafe {
        (*(last as *mut AtomicU64))
            .compare_exchange(start, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
    } {
        return xdp_action::XDP_PASS;
    }

    let packets = unsafe { *count };
    unsafe { *count = 0 };
    let pps = packets.saturating_mul(1_000_000_000) / elapsed;

    let severity: u32 = if pps >= THRESHOLD_CRITICAL {
        3
    } else if pps >= THRESHOLD_HIGH {
        2
    } else if pps >= THRESHOLD_MEDIUM {
        1
    } else if pps >= THRESHOLD_LOW {
        0
    } else {
        return xdp_action::XDP_PASS;
    };

    if let Some(mut entry) = BURST_EVENTS.reserve::<BurstEvent>(0) {
        let event = unsafe { &mut *entry.as_mut_ptr() };
        event.timestamp_ns = now;
        event.pps = pps;
        event.severity = severity;
        event._pad = 0;
        entry.submit(0);
    }

    xdp_action::XDP_PASS
}

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    unsafe { core::hint::unreachable_unchecked() }
}
