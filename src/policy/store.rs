//! Bounded policy tables with concurrent read access
//!
//! Two tables back every decision: the agent registry (pid -> governed flag)
//! and the whitelist (resource key -> verdict). Reads come from arbitrarily
//! many evaluation contexts at once; writes come only from the control plane
//! and are rare. Short `RwLock` critical sections guarantee a reader observes
//! either a fully applied write or no write at all - never a torn entry.
//!
//! Capacity is fixed at construction. Inserting a new key into a full table
//! fails with `CapacityExceeded`; nothing is ever silently evicted.

use std::collections::HashMap;
use std::sync::RwLock;

use super::resolver::ResourceKey;
use crate::engine::Verdict;

/// Default agent registry capacity.
pub const AGENT_CAPACITY: usize = 1024;

/// Default whitelist capacity.
pub const WHITELIST_CAPACITY: usize = 10_000;

/// Error type for control-plane mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// Table is full and the key is new; the operation was not applied
    CapacityExceeded { capacity: usize },
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::CapacityExceeded { capacity } => {
                write!(f, "policy table at capacity ({} entries)", capacity)
            }
        }
    }
}

impl std::error::Error for PolicyError {}

/// The policy store consulted by every decision evaluation.
pub struct PolicyStore {
    agents: RwLock<HashMap<u32, bool>>,
    whitelist: RwLock<HashMap<ResourceKey, Verdict>>,
    agent_capacity: usize,
    whitelist_capacity: usize,
}

impl PolicyStore {
    /// Create a store with explicit table capacities.
    pub fn new(agent_capacity: usize, whitelist_capacity: usize) -> Self {
        Self {
            agents: RwLock::new(HashMap::with_capacity(agent_capacity)),
            whitelist: RwLock::new(HashMap::with_capacity(whitelist_capacity.min(1024))),
            agent_capacity,
            whitelist_capacity,
        }
    }

    /// Create a store with the reference sizings (1024 agents, 10k entries).
    pub fn with_defaults() -> Self {
        Self::new(AGENT_CAPACITY, WHITELIST_CAPACITY)
    }

    /// Mark a pid as a governed agent. Idempotent: re-registering an
    /// already-registered pid is a no-op, not an error.
    pub fn register_agent(&self, pid: u32) -> Result<(), PolicyError> {
        let mut agents = self.agents.write().unwrap_or_else(|e| e.into_inner());
        if !agents.contains_key(&pid) && agents.len() >= self.agent_capacity {
            return Err(PolicyError::CapacityExceeded {
                capacity: self.agent_capacity,
            });
        }
        agents.insert(pid, true);
        Ok(())
    }

    /// Remove a pid from the registry. Absent-pid removal is a no-op.
    pub fn unregister_agent(&self, pid: u32) {
        let mut agents = self.agents.write().unwrap_or_else(|e| e.into_inner());
        agents.remove(&pid);
    }

    /// Whether this pid is a governed agent.
    ///
    /// Absence means "not an agent", never an error. A read failure is
    /// answered with `false`: an ungoverned verdict touches no counters and
    /// no whitelist, so this path cannot leak a permission.
    pub fn is_agent(&self, pid: u32) -> bool {
        match self.agents.read() {
            Ok(agents) => agents.get(&pid).copied().unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Insert or update a whitelist entry.
    ///
    /// Updates to existing keys always succeed; a new key is rejected with
    /// `CapacityExceeded` when the table is full, and the caller decides
    /// what to do about it.
    pub fn set_policy(&self, key: ResourceKey, verdict: Verdict) -> Result<(), PolicyError> {
        let mut whitelist = self.whitelist.write().unwrap_or_else(|e| e.into_inner());
        if !whitelist.contains_key(&key) && whitelist.len() >= self.whitelist_capacity {
            return Err(PolicyError::CapacityExceeded {
                capacity: self.whitelist_capacity,
            });
        }
        whitelist.insert(key, verdict);
        Ok(())
    }

    /// Remove a whitelist entry. Absent-key removal is a no-op.
    pub fn clear_policy(&self, key: &ResourceKey) {
        let mut whitelist = self.whitelist.write().unwrap_or_else(|e| e.into_inner());
        whitelist.remove(key);
    }

    /// Look up the verdict stored for a resource key.
    ///
    /// `None` for an absent entry, and also for a failed read: the engine
    /// maps both to `Block` (fail-closed).
    pub fn lookup(&self, key: &ResourceKey) -> Option<Verdict> {
        match self.whitelist.read() {
            Ok(whitelist) => whitelist.get(key).copied(),
            Err(_) => None,
        }
    }

    /// Number of registered agents.
    pub fn agent_count(&self) -> usize {
        self.agents.read().map(|a| a.len()).unwrap_or(0)
    }

    /// Number of whitelist entries.
    pub fn whitelist_len(&self) -> usize {
        self.whitelist.read().map(|w| w.len()).unwrap_or(0)
    }

    /// Snapshot of registered agent pids, for syncing enforcement tables.
    pub fn agents(&self) -> Vec<u32> {
        match self.agents.read() {
            Ok(agents) => agents.keys().copied().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Snapshot of whitelist entries, for syncing enforcement tables.
    pub fn entries(&self) -> Vec<(ResourceKey, Verdict)> {
        match self.whitelist.read() {
            Ok(whitelist) => whitelist.iter().map(|(k, v)| (*k, *v)).collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(s: &str) -> ResourceKey {
        ResourceKey::new(s.as_bytes()).unwrap()
    }

    #[test]
    fn test_absent_pid_is_not_agent() {
        let store = PolicyStore::with_defaults();
        assert!(!store.is_agent(12345));
    }

    #[test]
    fn test_register_unregister() {
        let store = PolicyStore::with_defaults();
        store.register_agent(42).unwrap();
        assert!(store.is_agent(42));
        store.unregister_agent(42);
        assert!(!store.is_agent(42));
        // Absent removal is a no-op
        store.unregister_agent(42);
    }

    #[test]
    fn test_idempotent_registration() {
        let store = PolicyStore::with_defaults();
        store.register_agent(42).unwrap();
        store.register_agent(42).unwrap();
        assert_eq!(store.agent_count(), 1);
    }

    #[test]
    fn test_agent_registry_capacity() {
        let store = PolicyStore::new(2, 10);
        store.register_agent(1).unwrap();
        store.register_agent(2).unwrap();
        assert_eq!(
            store.register_agent(3),
            Err(PolicyError::CapacityExceeded { capacity: 2 })
        );
        // Existing pids are unaffected and re-registration still succeeds
        assert!(store.is_agent(1));
        store.register_agent(2).unwrap();
    }

    #[test]
    fn test_set_and_clear_policy() {
        let store = PolicyStore::with_defaults();
        let k = key("/usr/bin/ls");
        assert_eq!(store.lookup(&k), None);

        store.set_policy(k, Verdict::Allow).unwrap();
        assert_eq!(store.lookup(&k), Some(Verdict::Allow));

        store.set_policy(k, Verdict::Block).unwrap();
        assert_eq!(store.lookup(&k), Some(Verdict::Block));

        store.clear_policy(&k);
        assert_eq!(store.lookup(&k), None);
        // Absent removal is a no-op
        store.clear_policy(&k);
    }

    #[test]
    fn test_whitelist_capacity_boundary() {
        let store = PolicyStore::new(10, 3);
        for i in 0..3 {
            store
                .set_policy(key(&format!("/bin/tool{}", i)), Verdict::Allow)
                .unwrap();
        }
        assert_eq!(
            store.set_policy(key("/bin/tool3"), Verdict::Allow),
            Err(PolicyError::CapacityExceeded { capacity: 3 })
        );
        // The existing entries remain readable and unchanged
        assert_eq!(store.whitelist_len(), 3);
        for i in 0..3 {
            assert_eq!(
                store.lookup(&key(&format!("/bin/tool{}", i))),
                Some(Verdict::Allow)
            );
        }
        // Updating an existing key still succeeds at capacity
        store.set_policy(key("/bin/tool0"), Verdict::Block).unwrap();
        assert_eq!(store.lookup(&key("/bin/tool0")), Some(Verdict::Block));
    }

    #[test]
    fn test_concurrent_reads_and_writes() {
        let store = Arc::new(PolicyStore::with_defaults());
        store.set_policy(key("/usr/bin/ls"), Verdict::Allow).unwrap();

        let mut handles = Vec::new();
        for t in 0..4 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..500 {
                    if t % 2 == 0 {
                        // Reader: must always observe a complete entry or none
                        let v = store.lookup(&key("/usr/bin/ls"));
                        assert!(v.is_none() || v == Some(Verdict::Allow));
                    } else {
                        // Writer: churn unrelated keys
                        let k = key(&format!("/tmp/w{}-{}", t, i));
                        store.set_policy(k, Verdict::Allow).unwrap();
                        store.clear_policy(&k);
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.lookup(&key("/usr/bin/ls")), Some(Verdict::Allow));
    }
}
