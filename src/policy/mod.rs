//! Policy storage and resource key resolution
//!
//! The policy store is the single source of truth the decision engine
//! consults: an agent registry (which pids are governed) and a whitelist
//! (which resources a governed agent may touch). Both tables are bounded,
//! mutated only by the control plane, and safe to read concurrently from
//! any number of evaluation contexts.
//!
//! Key resolution is pluggable: a deployment keys its whitelist either by
//! canonical filesystem path or by content hash, never both.

pub mod resolver;
pub mod store;

pub use resolver::{
    HashResolver, KeyResolver, PathResolver, ResolveError, ResourceKey, HASH_KEY_LEN,
    RESOURCE_KEY_LEN,
};
pub use store::{PolicyError, PolicyStore, AGENT_CAPACITY, WHITELIST_CAPACITY};
