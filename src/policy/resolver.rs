//! Resource key extraction for whitelist lookups
//!
//! A whitelist entry is keyed by a fixed-length byte buffer holding either a
//! canonical filesystem path (up to 256 bytes) or the hex form of a SHA-256
//! content digest (64 bytes). The keying strategy is chosen once per
//! deployment; mixing schemes in one table defeats whitelisting.

use crate::engine::InterceptedOperation;

/// Maximum resource key length in bytes (canonical path keys).
pub const RESOURCE_KEY_LEN: usize = 256;

/// Length of a hash-based key: hex encoding of a 32-byte digest.
pub const HASH_KEY_LEN: usize = 64;

/// A whitelist lookup key: fixed-size, zero-padded byte buffer.
///
/// Fixed sizing mirrors the enforcement tables this store is synced into
/// and keeps key comparison free of allocation on the evaluation path.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    bytes: [u8; RESOURCE_KEY_LEN],
    len: u16,
}

impl ResourceKey {
    /// Build a key from raw identifier bytes.
    ///
    /// Empty input means no identifier could be extracted; oversized input
    /// cannot match any stored entry, so both are resolution failures. The
    /// truncated variant keeps a safe prefix copy for the audit record.
    pub fn new(bytes: &[u8]) -> Result<Self, ResolveError> {
        if bytes.is_empty() {
            return Err(ResolveError::Missing);
        }
        if bytes.len() > RESOURCE_KEY_LEN {
            return Err(ResolveError::Truncated(Self::truncated(bytes)));
        }
        Ok(Self::truncated(bytes))
    }

    /// Build a key from a 32-byte content digest, hex-encoded to 64 bytes.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let hex = hex::encode(digest);
        debug_assert_eq!(hex.len(), HASH_KEY_LEN);
        Self::truncated(hex.as_bytes())
    }

    /// Copy at most `RESOURCE_KEY_LEN` bytes, never reading past the source.
    fn truncated(bytes: &[u8]) -> Self {
        let mut buf = [0u8; RESOURCE_KEY_LEN];
        let len = bytes.len().min(RESOURCE_KEY_LEN);
        buf[..len].copy_from_slice(&bytes[..len]);
        Self {
            bytes: buf,
            len: len as u16,
        }
    }

    /// The key's meaningful bytes, without zero padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The full zero-padded buffer, as stored in enforcement tables.
    pub fn padded(&self) -> [u8; RESOURCE_KEY_LEN] {
        self.bytes
    }

    /// Lossy display form for logs and audit rendering.
    pub fn display(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl std::fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResourceKey({})", self.display())
    }
}

/// Error type for key resolution.
///
/// Every variant resolves to a whitelist miss: an identifier that cannot be
/// extracted or reliably compared must never be permitted.
#[derive(Debug, Clone, Copy)]
pub enum ResolveError {
    /// No identifier could be extracted from the operation
    Missing,
    /// Identifier exceeded the fixed maximum; holds a safe prefix copy
    Truncated(ResourceKey),
}

impl ResolveError {
    /// Bytes recorded in the audit event for an unresolved identifier.
    pub fn partial(&self) -> [u8; RESOURCE_KEY_LEN] {
        match self {
            ResolveError::Missing => [0u8; RESOURCE_KEY_LEN],
            ResolveError::Truncated(key) => key.padded(),
        }
    }
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::Missing => write!(f, "resource identifier unresolved"),
            ResolveError::Truncated(key) => {
                write!(f, "resource identifier truncated: {}", key.display())
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Key extraction strategy: turns an intercepted operation into the
/// whitelist lookup key for this deployment.
pub trait KeyResolver: Send + Sync {
    fn resolve(&self, op: &InterceptedOperation<'_>) -> Result<ResourceKey, ResolveError>;
}

/// Keys the whitelist by canonical filesystem path.
pub struct PathResolver;

impl KeyResolver for PathResolver {
    fn resolve(&self, op: &InterceptedOperation<'_>) -> Result<ResourceKey, ResolveError> {
        ResourceKey::new(op.path)
    }
}

/// Keys the whitelist by content digest of the resource.
///
/// The digest is computed by the interception layer; an operation arriving
/// without one is unresolved and therefore blocked.
pub struct HashResolver;

impl KeyResolver for HashResolver {
    fn resolve(&self, op: &InterceptedOperation<'_>) -> Result<ResourceKey, ResolveError> {
        match op.content_hash {
            Some(digest) => Ok(ResourceKey::from_digest(digest)),
            None => Err(ResolveError::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{InterceptedOperation, OperationKind};

    fn exec_op(path: &[u8]) -> InterceptedOperation<'_> {
        InterceptedOperation {
            pid: 1,
            uid: 0,
            kind: OperationKind::Execute,
            path,
            content_hash: None,
        }
    }

    #[test]
    fn test_path_key_roundtrip() {
        let key = ResourceKey::new(b"/usr/bin/ls").unwrap();
        assert_eq!(key.as_bytes(), b"/usr/bin/ls");
        assert_eq!(key.display(), "/usr/bin/ls");
        assert_eq!(&key.padded()[..11], b"/usr/bin/ls");
        assert_eq!(key.padded()[11], 0);
    }

    #[test]
    fn test_empty_identifier_is_missing() {
        assert!(matches!(ResourceKey::new(b""), Err(ResolveError::Missing)));
    }

    #[test]
    fn test_oversized_identifier_is_truncated() {
        let long = vec![b'a'; RESOURCE_KEY_LEN + 1];
        match ResourceKey::new(&long) {
            Err(ResolveError::Truncated(key)) => {
                assert_eq!(key.as_bytes().len(), RESOURCE_KEY_LEN);
                assert!(key.as_bytes().iter().all(|&b| b == b'a'));
            }
            other => panic!("expected truncation, got {:?}", other.map(|k| k.display())),
        }
    }

    #[test]
    fn test_boundary_length_resolves() {
        let exact = vec![b'x'; RESOURCE_KEY_LEN];
        let key = ResourceKey::new(&exact).unwrap();
        assert_eq!(key.as_bytes().len(), RESOURCE_KEY_LEN);
    }

    #[test]
    fn test_digest_key_is_hex() {
        let key = ResourceKey::from_digest(&[0xab; 32]);
        assert_eq!(key.as_bytes().len(), HASH_KEY_LEN);
        assert_eq!(&key.as_bytes()[..4], b"abab");
    }

    #[test]
    fn test_path_resolver() {
        let op = exec_op(b"/tmp/x");
        let key = PathResolver.resolve(&op).unwrap();
        assert_eq!(key.as_bytes(), b"/tmp/x");
    }

    #[test]
    fn test_hash_resolver_requires_digest() {
        let digest = [7u8; 32];
        let mut op = exec_op(b"/tmp/x");
        assert!(matches!(
            HashResolver.resolve(&op),
            Err(ResolveError::Missing)
        ));

        op.content_hash = Some(&digest);
        let key = HashResolver.resolve(&op).unwrap();
        assert_eq!(key, ResourceKey::from_digest(&digest));
    }

    #[test]
    fn test_keys_compare_by_content() {
        let a = ResourceKey::new(b"/usr/bin/ls").unwrap();
        let b = ResourceKey::new(b"/usr/bin/ls").unwrap();
        let c = ResourceKey::new(b"/usr/bin/cat").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
