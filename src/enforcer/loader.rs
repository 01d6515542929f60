//! Loader for the LSM enforcement programs
//!
//! Loads the pre-compiled LSM bytecode, attaches both hooks, and mirrors
//! control-plane mutations into the kernel maps. The kernel decides with
//! its own copy of the tables; this side keeps that copy current and reads
//! back stats.

use aya::maps::{Array, HashMap, MapData};
use aya::programs::Lsm;
use aya::{include_bytes_aligned, Bpf, Btf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::collector::run_collector;
use super::EnforcerError;
use crate::audit::AuditEmitter;
use crate::engine::Verdict;
use crate::policy::{PolicyStore, ResourceKey, RESOURCE_KEY_LEN};
use crate::stats::CounterSnapshot;

// Slot layout of the kernel STATS array
const STAT_CHECKS: u32 = 0;
const STAT_BLOCKS: u32 = 1;
const STAT_ALLOWS: u32 = 2;

/// Manages the LSM BPF programs for in-kernel enforcement.
pub struct LsmEnforcer {
    bpf: Arc<RwLock<Bpf>>,
    collector_handle: Option<JoinHandle<()>>,
    enabled: bool,
}

impl LsmEnforcer {
    /// Load and attach the enforcement programs.
    ///
    /// Returns None if BPF LSM is unsupported or loading fails; the daemon
    /// continues with in-process evaluation only.
    pub fn new() -> Option<Self> {
        match Self::try_new() {
            Ok(enforcer) => {
                tracing::info!("in-kernel enforcement attached (exec + open hooks)");
                Some(enforcer)
            }
            Err(e) => {
                tracing::warn!("in-kernel enforcement unavailable: {} (continuing without it)", e);
                None
            }
        }
    }

    fn try_new() -> Result<Self, EnforcerError> {
        if !Self::check_lsm_support() {
            return Err(EnforcerError::NotSupported(
                "bpf not in LSM list (check /sys/kernel/security/lsm)".to_string(),
            ));
        }

        // Load BTF for CO-RE
        let btf = Btf::from_sys_fs().map_err(|e| EnforcerError::LoadError(e.to_string()))?;

        // Load the pre-compiled LSM bytecode
        let bpf_bytes = include_bytes_aligned!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/target/ebpf/lsm-guard.o"
        ));

        let mut bpf = Bpf::load(bpf_bytes).map_err(|e| EnforcerError::LoadError(e.to_string()))?;

        for (name, hook) in [
            ("exec_check", "bprm_check_security"),
            ("open_check", "file_open"),
        ] {
            let program: &mut Lsm = bpf
                .program_mut(name)
                .ok_or_else(|| EnforcerError::LoadError(format!("{} program not found", name)))?
                .try_into()
                .map_err(|e: aya::programs::ProgramError| EnforcerError::LoadError(e.to_string()))?;

            program
                .load(hook, &btf)
                .map_err(|e| EnforcerError::LoadError(e.to_string()))?;

            program
                .attach()
                .map_err(|e| EnforcerError::AttachError(e.to_string()))?;
        }

        Ok(Self {
            bpf: Arc::new(RwLock::new(bpf)),
            collector_handle: None,
            enabled: true,
        })
    }

    /// Check if the kernel has BPF in the LSM list
    fn check_lsm_support() -> bool {
        if let Ok(lsm) = std::fs::read_to_string("/sys/kernel/security/lsm") {
            lsm.contains("bpf")
        } else {
            false
        }
    }

    /// Whether enforcement is attached.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Mirror an agent registration into the kernel map.
    pub async fn register_agent(&self, pid: u32) -> Result<(), EnforcerError> {
        let mut bpf = self.bpf.write().await;
        let mut pid_map: HashMap<_, u32, u8> = bpf
            .map_mut("AGENT_PIDS")
            .ok_or_else(|| EnforcerError::MapError("AGENT_PIDS map not found".to_string()))?
            .try_into()
            .map_err(|e: aya::maps::MapError| EnforcerError::MapError(e.to_string()))?;

        pid_map
            .insert(pid, 1, 0)
            .map_err(|e| EnforcerError::MapError(e.to_string()))?;

        tracing::debug!(pid, "governing pid in kernel");
        Ok(())
    }

    /// Mirror an agent unregistration into the kernel map.
    pub async fn unregister_agent(&self, pid: u32) -> Result<(), EnforcerError> {
        let mut bpf = self.bpf.write().await;
        let mut pid_map: HashMap<_, u32, u8> = bpf
            .map_mut("AGENT_PIDS")
            .ok_or_else(|| EnforcerError::MapError("AGENT_PIDS map not found".to_string()))?
            .try_into()
            .map_err(|e: aya::maps::MapError| EnforcerError::MapError(e.to_string()))?;

        let _ = pid_map.remove(&pid); // Absent pid is a no-op
        tracing::debug!(pid, "released pid in kernel");
        Ok(())
    }

    /// Mirror one whitelist entry into the kernel map.
    pub async fn set_policy(&self, key: &ResourceKey, verdict: Verdict) -> Result<(), EnforcerError> {
        let mut bpf = self.bpf.write().await;
        let mut whitelist = Self::whitelist_map(&mut bpf)?;

        let value = match verdict {
            Verdict::Allow => 1u8,
            Verdict::Block => 0u8,
        };
        whitelist
            .insert(key.padded(), value, 0)
            .map_err(|e| EnforcerError::MapError(e.to_string()))?;
        Ok(())
    }

    /// Remove one whitelist entry from the kernel map.
    pub async fn clear_policy(&self, key: &ResourceKey) -> Result<(), EnforcerError> {
        let mut bpf = self.bpf.write().await;
        let mut whitelist = Self::whitelist_map(&mut bpf)?;
        let _ = whitelist.remove(&key.padded());
        Ok(())
    }

    /// Push the full current policy into the kernel maps.
    ///
    /// Used after attach so enforcement starts from the seeded state.
    pub async fn sync_policy(&self, store: &PolicyStore) -> Result<(), EnforcerError> {
        for pid in store.agents() {
            self.register_agent(pid).await?;
        }
        let entries = store.entries();
        let count = entries.len();
        for (key, verdict) in entries {
            self.set_policy(&key, verdict).await?;
        }
        tracing::info!(
            agents = store.agent_count(),
            entries = count,
            "synced policy into kernel maps"
        );
        Ok(())
    }

    /// Read the kernel-side decision counters.
    pub async fn read_counters(&self) -> Result<CounterSnapshot, EnforcerError> {
        let bpf = self.bpf.read().await;
        let stats: Array<_, u64> = bpf
            .map("STATS")
            .ok_or_else(|| EnforcerError::MapError("STATS map not found".to_string()))?
            .try_into()
            .map_err(|e: aya::maps::MapError| EnforcerError::MapError(e.to_string()))?;

        let read = |idx: u32| stats.get(&idx, 0).unwrap_or(0);
        Ok(CounterSnapshot {
            checks: read(STAT_CHECKS),
            blocks: read(STAT_BLOCKS),
            allows: read(STAT_ALLOWS),
        })
    }

    /// Administrative reset of the kernel-side counters.
    pub async fn reset_counters(&self) -> Result<(), EnforcerError> {
        let mut bpf = self.bpf.write().await;
        let mut stats: Array<_, u64> = bpf
            .map_mut("STATS")
            .ok_or_else(|| EnforcerError::MapError("STATS map not found".to_string()))?
            .try_into()
            .map_err(|e: aya::maps::MapError| EnforcerError::MapError(e.to_string()))?;

        for idx in [STAT_CHECKS, STAT_BLOCKS, STAT_ALLOWS] {
            stats
                .set(idx, 0, 0)
                .map_err(|e| EnforcerError::MapError(e.to_string()))?;
        }
        Ok(())
    }

    /// Start the background task draining the kernel audit ring buffer
    /// into the shared audit channel.
    pub fn start_collector(&mut self, audit: AuditEmitter) {
        let bpf = Arc::clone(&self.bpf);
        let handle = tokio::spawn(async move {
            if let Err(e) = run_collector(bpf, audit).await {
                tracing::error!("audit collector error: {}", e);
            }
        });
        self.collector_handle = Some(handle);
        tracing::info!("kernel audit collector started");
    }

    fn whitelist_map(
        bpf: &mut Bpf,
    ) -> Result<HashMap<&mut MapData, [u8; RESOURCE_KEY_LEN], u8>, EnforcerError> {
        bpf.map_mut("WHITELIST")
            .ok_or_else(|| EnforcerError::MapError("WHITELIST map not found".to_string()))?
            .try_into()
            .map_err(|e: aya::maps::MapError| EnforcerError::MapError(e.to_string()))
    }
}
