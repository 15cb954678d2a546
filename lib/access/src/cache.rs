//! Cached role fallback.
//!
//! The last role the backend confirmed for a UID is persisted so the next
//! page load can render the correct menu before the network responds, and so
//! the resolver can degrade gracefully when the role endpoint is down. The
//! cache is written only by the resolver and cleared on sign-out. It is
//! never an input to a fresh authorization decision.

use crate::role::Role;
use hillcrest_core::ProviderUid;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Best-effort storage for the last confirmed role.
///
/// Implementations must tolerate failure silently: a missing or corrupt
/// cache only costs a degraded fallback, never an error.
pub trait RoleCache: Send + Sync {
    /// Returns the cached role for this UID, if one is stored.
    fn load(&self, uid: &ProviderUid) -> Option<Role>;

    /// Stores the role for this UID, replacing any previous entry.
    fn store(&self, uid: &ProviderUid, role: Role);

    /// Removes any stored entry.
    fn clear(&self);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CachedRole {
    uid: ProviderUid,
    role: Role,
}

/// In-process cache, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRoleCache {
    entry: Mutex<Option<CachedRole>>,
}

impl MemoryRoleCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoleCache for MemoryRoleCache {
    fn load(&self, uid: &ProviderUid) -> Option<Role> {
        let entry = self.entry.lock().expect("role cache lock poisoned");
        entry
            .as_ref()
            .filter(|cached| &cached.uid == uid)
            .map(|cached| cached.role)
    }

    fn store(&self, uid: &ProviderUid, role: Role) {
        let mut entry = self.entry.lock().expect("role cache lock poisoned");
        *entry = Some(CachedRole {
            uid: uid.clone(),
            role,
        });
    }

    fn clear(&self) {
        let mut entry = self.entry.lock().expect("role cache lock poisoned");
        *entry = None;
    }
}

/// File-backed cache that survives process restarts.
///
/// Stores a single JSON entry. The file plays the part a browser's local
/// storage plays for a web client.
#[derive(Debug)]
pub struct FileRoleCache {
    path: PathBuf,
}

impl FileRoleCache {
    /// Creates a cache backed by the given file path.
    ///
    /// The file is created on first store; a missing file reads as empty.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RoleCache for FileRoleCache {
    fn load(&self, uid: &ProviderUid) -> Option<Role> {
        let bytes = std::fs::read(&self.path).ok()?;
        let cached: CachedRole = serde_json::from_slice(&bytes).ok()?;
        (&cached.uid == uid).then_some(cached.role)
    }

    fn store(&self, uid: &ProviderUid, role: Role) {
        let cached = CachedRole {
            uid: uid.clone(),
            role,
        };
        let json = match serde_json::to_vec(&cached) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to encode role cache entry");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, json) {
            warn!(error = %err, path = %self.path.display(), "failed to write role cache");
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "failed to clear role cache");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cache_roundtrip() {
        let cache = MemoryRoleCache::new();
        let uid = ProviderUid::from("uid_1");

        assert_eq!(cache.load(&uid), None);
        cache.store(&uid, Role::Member);
        assert_eq!(cache.load(&uid), Some(Role::Member));
    }

    #[test]
    fn memory_cache_is_keyed_by_uid() {
        let cache = MemoryRoleCache::new();
        cache.store(&ProviderUid::from("uid_1"), Role::Admin);

        assert_eq!(cache.load(&ProviderUid::from("uid_2")), None);
    }

    #[test]
    fn memory_cache_clear_removes_entry() {
        let cache = MemoryRoleCache::new();
        let uid = ProviderUid::from("uid_1");
        cache.store(&uid, Role::Admin);

        cache.clear();
        assert_eq!(cache.load(&uid), None);
    }

    #[test]
    fn file_cache_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("role-cache.json");
        let uid = ProviderUid::from("uid_1");

        {
            let cache = FileRoleCache::new(path.clone());
            cache.store(&uid, Role::Member);
        }

        let reopened = FileRoleCache::new(path);
        assert_eq!(reopened.load(&uid), Some(Role::Member));
    }

    #[test]
    fn file_cache_missing_file_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = FileRoleCache::new(dir.path().join("absent.json"));
        assert_eq!(cache.load(&ProviderUid::from("uid_1")), None);
    }

    #[test]
    fn file_cache_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("role-cache.json");
        std::fs::write(&path, b"not json").expect("write");

        let cache = FileRoleCache::new(path);
        assert_eq!(cache.load(&ProviderUid::from("uid_1")), None);
    }

    #[test]
    fn file_cache_clear_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("role-cache.json");
        let cache = FileRoleCache::new(path);

        cache.clear();
        cache.store(&ProviderUid::from("uid_1"), Role::User);
        cache.clear();
        cache.clear();
        assert_eq!(cache.load(&ProviderUid::from("uid_1")), None);
    }
}
