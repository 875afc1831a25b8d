use super::{CacheEntry, CacheKey, CacheStore, CachedValue};
use crate::db::Database;
use crate::error::Result;

/// Persists entries across runs of the CLI. Same policy as the in-memory
/// store: replaced on refetch, dropped on invalidation. Keys carry the day
/// the data applies to; see [`Database::prune_cache_entries_before`] for
/// clearing out older days.
impl CacheStore for Database {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        self.get_cache_entry(key)
    }

    fn set(&self, key: CacheKey, value: CachedValue) -> Result<()> {
        self.put_cache_entry(&key, &value)
    }

    fn invalidate(&self, key: &CacheKey) -> Result<()> {
        self.delete_cache_entry(key)
    }

    fn mark_stale(&self, key: &CacheKey) -> Result<()> {
        self.mark_cache_entry_stale(key)
    }

    fn keys(&self) -> Result<Vec<CacheKey>> {
        self.list_cache_keys()
    }

    fn clear(&self) -> Result<()> {
        self.clear_cache_entries()
    }
}
