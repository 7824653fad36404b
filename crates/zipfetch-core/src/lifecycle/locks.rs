//! Per-name serialization for archive files.
//!
//! Every operation that touches a named archive (create, append, stream,
//! delete, janitor removal) holds that name's guard for its whole duration.
//! Request paths wait for the guard; the janitor only tries and skips.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Registry = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Registry of one async mutex per archive name. Cheap to clone; clones
/// share the registry.
#[derive(Debug, Clone, Default)]
pub struct ArchiveLocks {
    inner: Registry,
}

impl ArchiveLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `name`.
    pub async fn lock(&self, name: &str) -> NameGuard {
        let mutex = self.entry(name);
        let guard = mutex.lock_owned().await;
        self.guard(name, guard)
    }

    /// Take `name` only if nobody holds or waits for it.
    pub fn try_lock(&self, name: &str) -> Option<NameGuard> {
        let mutex = self.entry(name);
        match mutex.try_lock_owned() {
            Ok(guard) => Some(self.guard(name, guard)),
            Err(_) => None,
        }
    }

    /// Names currently registered (held or awaited).
    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, name: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.registry();
        Arc::clone(map.entry(name.to_string()).or_default())
    }

    fn guard(&self, name: &str, guard: OwnedMutexGuard<()>) -> NameGuard {
        NameGuard {
            guard: Some(guard),
            name: name.to_string(),
            locks: self.clone(),
        }
    }

    /// Drop the registry entry if only the map still references it.
    fn prune(&self, name: &str) {
        let mut map = self.registry();
        if let Some(mutex) = map.get(name) {
            if Arc::strong_count(mutex) == 1 {
                map.remove(name);
            }
        }
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Exclusive hold on one archive name; released on drop.
#[derive(Debug)]
pub struct NameGuard {
    guard: Option<OwnedMutexGuard<()>>,
    name: String,
    locks: ArchiveLocks,
}

impl NameGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NameGuard {
    fn drop(&mut self) {
        // Unlock first so the guard's own Arc no longer counts.
        drop(self.guard.take());
        self.locks.prune(&self.name);
    }
}
