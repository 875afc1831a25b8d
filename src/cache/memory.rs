use super::{CacheEntry, CacheKey, CacheStore, CachedValue};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Process-local cache, shared between concurrent fetches of one session.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: CacheKey, value: CachedValue) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, CacheEntry::fresh(value));
        Ok(())
    }

    fn invalidate(&self, key: &CacheKey) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    fn mark_stale(&self, key: &CacheKey) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(key) {
            entry.stale = true;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<CacheKey>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.keys().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}
