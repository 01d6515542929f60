//! Daemon configuration and policy seeding
//!
//! The daemon reads a JSON config at startup: table capacities, the keying
//! strategy, audit sizing, and the initial policy (agent pids, allowed and
//! explicitly denied resources). Seeding goes through the same control-plane
//! operations as runtime updates.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::audit::AUDIT_BUFFER_BYTES;
use crate::burst::BurstThresholds;
use crate::policy::{HashResolver, KeyResolver, PathResolver, AGENT_CAPACITY, WHITELIST_CAPACITY};

/// Whitelist keying strategy, chosen once per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// Canonical filesystem path keys
    Path,
    /// Content-hash keys (hex SHA-256)
    Hash,
}

impl KeyStrategy {
    /// The resolver implementing this strategy.
    pub fn resolver(&self) -> Arc<dyn KeyResolver> {
        match self {
            KeyStrategy::Path => Arc::new(PathResolver),
            KeyStrategy::Hash => Arc::new(HashResolver),
        }
    }
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub key_strategy: KeyStrategy,
    pub agent_capacity: usize,
    pub whitelist_capacity: usize,
    pub audit_buffer_bytes: usize,
    /// Pids registered as governed agents at startup.
    pub seed_agents: Vec<u32>,
    /// Resources whitelisted at startup (paths, or hex digests under the
    /// hash strategy).
    pub seed_allow: Vec<String>,
    /// Deliberate denials recorded at startup for audit clarity.
    pub seed_block: Vec<String>,
    pub burst: BurstThresholds,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            key_strategy: KeyStrategy::Path,
            agent_capacity: AGENT_CAPACITY,
            whitelist_capacity: WHITELIST_CAPACITY,
            audit_buffer_bytes: AUDIT_BUFFER_BYTES,
            seed_agents: Vec::new(),
            seed_allow: Vec::new(),
            seed_block: Vec::new(),
            burst: BurstThresholds::default(),
        }
    }
}

impl GuardConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(path.display().to_string(), e))
    }
}

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file
    Io(String, std::io::Error),
    /// Config file is not valid JSON for `GuardConfig`
    Parse(String, serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "config read error ({}): {}", path, e),
            ConfigError::Parse(path, e) => write!(f, "config parse error ({}): {}", path, e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GuardConfig::default();
        assert_eq!(config.key_strategy, KeyStrategy::Path);
        assert_eq!(config.agent_capacity, 1024);
        assert_eq!(config.whitelist_capacity, 10_000);
        assert_eq!(config.audit_buffer_bytes, 256 * 1024);
        assert!(config.seed_agents.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let raw = r#"{
            "key_strategy": "path",
            "whitelist_capacity": 500,
            "seed_agents": [42, 43],
            "seed_allow": ["/usr/bin/ls", "/usr/bin/cat"],
            "seed_block": ["/etc/shadow"],
            "burst": { "low": 100, "medium": 1000, "high": 5000, "critical": 10000 }
        }"#;
        let config: GuardConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.whitelist_capacity, 500);
        assert_eq!(config.seed_agents, vec![42, 43]);
        assert_eq!(config.seed_allow.len(), 2);
        assert_eq!(config.seed_block, vec!["/etc/shadow"]);
        assert_eq!(config.burst.low, 100);
        // Unspecified fields fall back to defaults
        assert_eq!(config.agent_capacity, 1024);
    }

    #[test]
    fn test_parse_hash_strategy() {
        let config: GuardConfig = serde_json::from_str(r#"{"key_strategy": "hash"}"#).unwrap();
        assert_eq!(config.key_strategy, KeyStrategy::Hash);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(GuardConfig::load(Path::new("/nonexistent/vetogate.json")).is_err());
    }
}
