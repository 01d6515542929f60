//! eBPF LSM enforcement programs
//!
//! Attaches to the `bprm_check_security` (execute-binary) and `file_open`
//! LSM hooks and vetoes operations for governed agent pids before they take
//! effect. Decisions are fail-closed: a pid in AGENT_PIDS may only touch
//! resources with an explicit allow entry in WHITELIST; everything else -
//! missing entries, explicit blocks, unreadable paths - denies with
//! -EACCES.
//!
//! Userspace (the LsmEnforcer) populates AGENT_PIDS and WHITELIST, reads
//! the STATS array, and drains decision events from the EVENTS ring buffer.

#![no_std]
#![no_main]

mod bindings;

use core::sync::atomic::{AtomicU64, Ordering};

use aya_ebpf::{
    helpers::{
        bpf_get_current_pid_tgid, bpf_get_current_uid_gid, bpf_ktime_get_ns,
        bpf_probe_read_kernel, bpf_probe_read_kernel_str_bytes,
    },
    macros::{lsm, map},
    maps::{Array, HashMap, RingBuf},
    programs::LsmContext,
};

use bindings::{file, linux_binprm, path};

/// Maximum number of governed agent pids
const MAX_AGENTS: u32 = 1024;

/// Maximum number of whitelist entries
const MAX_WHITELIST: u32 = 10_000;

/// Fixed resource key length (full canonical paths)
const RESOURCE_KEY_LEN: usize = 256;

/// Audit ring buffer size
const EVENTS_BYTES: u32 = 256 * 1024;

const EACCES: i32 = 13;

// Slot layout of the STATS array
const STAT_CHECKS: u32 = 0;
const STAT_BLOCKS: u32 = 1;
const STAT_ALLOWS: u32 = 2;

/// BPF Map: pid -> governed flag. Populated from userspace.
#[map]
static AGENT_PIDS: HashMap<u32, u8> = HashMap::with_max_entries(MAX_AGENTS, 0);

/// BPF Map: resource key -> 1 (allow) / 0 (block). Populated from userspace.
#[map]
static WHITELIST: HashMap<[u8; RESOURCE_KEY_LEN], u8> =
    HashMap::with_max_entries(MAX_WHITELIST, 0);

/// BPF Map: decision counters (checks, blocks, allows).
#[map]
static STATS: Array<u64> = Array::with_max_entries(3, 0);

/// BPF Map: audit ring buffer drained by userspace.
#[map]
static EVENTS: RingBuf = RingBuf::with_byte_size(EVENTS_BYTES, 0);

/// Decision event published per evaluated operation.
/// Layout must match the userspace collector's KernelEvent.
#[repr(C)]
struct Event {
    pid: u32,
    uid: u32,
    resource: [u8; RESOURCE_KEY_LEN],
    verdict: u8,
    _pad: [u8; 7],
    timestamp_ns: u64,
}

/// LSM hook: intercept execve before the binary runs.
#[lsm(hook = "bprm_check_security")]
pub fn exec_check(ctx: LsmContext) -> i32 {
    match try_exec_check(&ctx) {
        Ok(ret) => ret,
        // Context access failure resolves to deny, never to allow
        Err(_) => -EACCES,
    }
}

fn try_exec_check(ctx: &LsmContext) -> Result<i32, i64> {
    // If a previous LSM already denied access, respect it
    let prev: i32 = unsafe { ctx.arg(1) };
    if prev != 0 {
        return Ok(prev);
    }

    let pid = (unsafe { bpf_get_current_pid_tgid() } >> 32) as u32;
    if !is_agent(pid) {
        return Ok(0);
    }
    let uid = (unsafe { bpf_get_current_uid_gid() } & 0xFFFF_FFFF) as u32;

    // Read the binary path; an unreadable path leaves the key zeroed,
    // which matches nothing in the whitelist
    let mut key = [0u8; RESOURCE_KEY_LEN];
    let bprm: *const linux_binprm = unsafe { ctx.arg(0) };
    if let Ok(filename) = unsafe { bpf_probe_read_kernel(&(*bprm).filename) } {
        let _ = unsafe { bpf_probe_read_kernel_str_bytes(filename as *const u8, &mut key) };
    }

    Ok(decide(pid, uid, &key))
}

/// LSM hook: intercept file open before the kernel opens it.
#[lsm(hook = "file_open")]
pub fn open_check(ctx: LsmContext) -> i32 {
    match try_open_check(&ctx) {
        Ok(ret) => ret,
        Err(_) => -EACCES,
    }
}

fn try_open_check(ctx: &LsmContext) -> Result<i32, i64> {
    let prev: i32 = unsafe { ctx.arg(1) };
    if prev != 0 {
        return Ok(prev);
    }

    let pid = (unsafe { bpf_get_current_pid_tgid() } >> 32) as u32;
    if !is_agent(pid) {
        return Ok(0);
    }
    let uid = (unsafe { bpf_get_current_uid_gid() } & 0xFFFF_FFFF) as u32;

    let mut key = [0u8; RESOURCE_KEY_LEN];
    let f: *const file = unsafe { ctx.arg(0) };
    let ret = unsafe {
        aya_ebpf::helpers::gen::bpf_d_path(
            &(*f).f_path as *const path as *mut _,
            key.as_mut_ptr() as *mut _,
            RESOURCE_KEY_LEN as u32,
        )
    };
    if ret < 0 {
        // Unresolved path: zeroed key, blocked like any other miss
        key = [0u8; RESOURCE_KEY_LEN];
    }

    Ok(decide(pid, uid, &key))
}

/// Whether this pid is a governed agent; everyone else bypasses evaluation.
fn is_agent(pid: u32) -> bool {
    matches!(unsafe { AGENT_PIDS.get(&pid) }, Some(&flag) if flag != 0)
}

/// The decision: only an explicit allow entry permits the operation.
fn decide(pid: u32, uid: u32, key: &[u8; RESOURCE_KEY_LEN]) -> i32 {
    bump(STAT_CHECKS);

    let allowed = matches!(unsafe { WHITELIST.get(key) }, Some(&1));
    if allowed {
        bump(STAT_ALLOWS);
        emit(pid, uid, key, 1);
        0
    } else {
        bump(STAT_BLOCKS);
        emit(pid, uid, key, 0);
        -EACCES
    }
}

/// Atomic counter add, safe under concurrent invocation on all CPUs.
fn bump(slot: u32) {
    if let Some(count) = STATS.get_ptr_mut(slot) {
        unsafe { (*(count as *mut AtomicU64)).fetch_add(1, Ordering::Relaxed) };
    }
}

/// Publish one decision event. A full ring buffer drops the event; the
/// verdict already stands and the caller is never stalled.
fn emit(pid: u32, uid: u32, key: &[u8; RESOURCE_KEY_LEN], verdict: u8) {
    if let Some(mut entry) = EVENTS.reserve::<Event>(0) {
        let event = unsafe { &mut *entry.as_mut_ptr() };
        event.pid = pid;
        event.uid = uid;
        event.resource = *key;
        event.verdict = verdict;
        event._pad = [0u8; 7];
        event.timestamp_ns = unsafe { bpf_ktime_get_ns() };
        entry.submit(0);
    }
}

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    unsafe { core::hint::unreachable_unchecked() }
}
