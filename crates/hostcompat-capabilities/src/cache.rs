//! Cached capability answers.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hostcompat_core::Capability;
use tracing::debug;

/// Memoized capability answers.
///
/// Answers depend on the host context, so the whole cache is dropped when a
/// new context arrives rather than per entry. Every invalidation starts a new
/// generation; an answer probed under an older generation is never stored.
#[derive(Debug, Default)]
pub struct CapabilityCache {
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<Capability, bool>,
}

impl CapabilityCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached answer for `capability`, if any.
    #[must_use]
    pub fn get(&self, capability: Capability) -> Option<bool> {
        self.read().entries.get(&capability).copied()
    }

    /// Current generation. Read it before probing and hand it back to
    /// [`insert`](Self::insert).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Remember `supported` for `capability`, if no invalidation happened
    /// since `generation` was read. Returns `true` if the answer was stored.
    pub fn insert(&self, capability: Capability, supported: bool, generation: u64) -> bool {
        let mut state = self.write();
        if state.generation != generation {
            debug!(%capability, "capability answer predates a context change; not cached");
            return false;
        }
        state.entries.insert(capability, supported);
        true
    }

    /// Forget every cached answer and start a new generation.
    pub fn invalidate(&self) {
        let mut state = self.write();
        state.generation = state.generation.wrapping_add(1);
        if !state.entries.is_empty() {
            debug!(entries = state.entries.len(), "capability cache invalidated");
            state.entries.clear();
        }
    }

    /// Number of cached answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_invalidate() {
        let cache = CapabilityCache::new();
        assert!(cache.get(Capability::Haptics).is_none());

        let generation = cache.generation();
        assert!(cache.insert(Capability::Haptics, true, generation));
        assert!(cache.insert(Capability::Camera, false, generation));
        assert_eq!(cache.get(Capability::Haptics), Some(true));
        assert_eq!(cache.get(Capability::Camera), Some(false));
        assert_eq!(cache.len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.get(Capability::Haptics).is_none());
    }

    #[test]
    fn test_stale_generation_not_stored() {
        let cache = CapabilityCache::new();
        let before = cache.generation();

        cache.invalidate();
        assert_ne!(cache.generation(), before);
        assert!(!cache.insert(Capability::Haptics, true, before));
        assert!(cache.get(Capability::Haptics).is_none());

        assert!(cache.insert(Capability::Haptics, false, cache.generation()));
        assert_eq!(cache.get(Capability::Haptics), Some(false));
    }
}
