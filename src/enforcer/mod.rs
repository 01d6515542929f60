//! eBPF LSM enforcement
//!
//! The decision contract deployed at the kernel boundary: LSM programs
//! attached to `bprm_check_security` (execute) and `file_open` veto
//! operations in-kernel, consulting maps this module keeps in sync with
//! the userspace policy store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Kernel Space (eBPF LSM programs)                           │
//! │                                                             │
//! │  bprm_check_security ─┐                                     │
//! │  file_open ───────────┼──► AGENT_PIDS, WHITELIST lookup     │
//! │                       │         │                           │
//! │                       │    STATS +1, EVENTS ringbuf         │
//! │                       └──► 0 (allow) / -EACCES (deny)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  User Space (LsmEnforcer)                                   │
//! │                                                             │
//! │  register_agent(pid)   → insert into AGENT_PIDS             │
//! │  set_policy(key, v)    → insert into WHITELIST              │
//! │  read_counters()       → read STATS                         │
//! │  start_collector()     → drain EVENTS into DecisionRecords  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Requirements
//!
//! - Linux kernel 5.8+ with CONFIG_BPF_LSM=y
//! - "bpf" in the active LSM list (/sys/kernel/security/lsm)
//! - CAP_BPF and CAP_MAC_ADMIN capabilities (or root)
//! - Pre-built eBPF objects in target/ebpf/ (see ebpf-programs/)
//! - Compiled with `--features ebpf`

#[cfg(feature = "ebpf")]
mod collector;
#[cfg(feature = "ebpf")]
mod loader;

#[cfg(feature = "ebpf")]
pub use loader::LsmEnforcer;

/// Error type for enforcement operations.
#[derive(Debug)]
pub enum EnforcerError {
    /// Failed to load an eBPF program
    LoadError(String),
    /// Failed to attach an eBPF program
    AttachError(String),
    /// Failed to access a BPF map
    MapError(String),
    /// BPF LSM not supported by this kernel or build
    NotSupported(String),
}

impl std::fmt::Display for EnforcerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnforcerError::LoadError(msg) => write!(f, "enforcer load error: {}", msg),
            EnforcerError::AttachError(msg) => write!(f, "enforcer attach error: {}", msg),
            EnforcerError::MapError(msg) => write!(f, "enforcer map error: {}", msg),
            EnforcerError::NotSupported(msg) => write!(f, "enforcer not supported: {}", msg),
        }
    }
}

impl std::error::Error for EnforcerError {}

/// Stub enforcer for builds without the `ebpf` feature.
///
/// Lets the daemon compile and run with in-process evaluation only.
#[cfg(not(feature = "ebpf"))]
pub struct LsmEnforcer;

#[cfg(not(feature = "ebpf"))]
impl LsmEnforcer {
    /// Returns None when the eBPF feature is disabled.
    pub fn new() -> Option<Self> {
        tracing::info!("eBPF enforcement not enabled at compile time");
        None
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub async fn register_agent(&self, _pid: u32) -> Result<(), EnforcerError> {
        Ok(())
    }

    pub async fn unregister_agent(&self, _pid: u32) -> Result<(), EnforcerError> {
        Ok(())
    }

    pub async fn sync_policy(&self, _store: &crate::policy::PolicyStore) -> Result<(), EnforcerError> {
        Ok(())
    }

    pub async fn read_counters(&self) -> Result<crate::stats::CounterSnapshot, EnforcerError> {
        Err(EnforcerError::NotSupported("ebpf feature disabled".to_string()))
    }
}
