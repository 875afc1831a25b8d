use crate::cache::{CacheEntry, CacheKey, CachedValue};
use crate::db::Database;
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

// Cache Entry Queries

impl Database {
    pub fn put_cache_entry(&self, key: &CacheKey, value: &CachedValue) -> Result<()> {
        let key_json = serde_json::to_string(key)?;
        let value_json = serde_json::to_string(value)?;
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO cache_entries
                    (storage_key, resource, key_json, value_json, stale, stored_at)
                VALUES (?1, ?2, ?3, ?4, 0, ?5)
                "#,
                params![
                    key.storage_key(),
                    key.resource().as_str(),
                    key_json,
                    value_json,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Rows whose JSON no longer matches the current model are dropped and
    /// reported as a miss.
    pub fn get_cache_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let storage_key = key.storage_key();
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT value_json, stale, stored_at FROM cache_entries WHERE storage_key = ?1",
                [&storage_key],
                row_to_raw_entry,
            )
            .optional()
            .map_err(Into::into)
        })?;

        let Some(raw) = row else {
            return Ok(None);
        };

        match serde_json::from_str::<CachedValue>(&raw.value_json) {
            Ok(value) => Ok(Some(CacheEntry {
                value,
                stale: raw.stale,
                stored_at: DateTime::parse_from_rfc3339(&raw.stored_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })),
            Err(e) => {
                warn!(key = %storage_key, error = %e, "Unreadable cache entry, discarding");
                self.delete_cache_entry(key)?;
                Ok(None)
            }
        }
    }

    pub fn delete_cache_entry(&self, key: &CacheKey) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM cache_entries WHERE storage_key = ?1",
                [key.storage_key()],
            )?;
            Ok(())
        })
    }

    pub fn mark_cache_entry_stale(&self, key: &CacheKey) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE cache_entries SET stale = 1 WHERE storage_key = ?1",
                [key.storage_key()],
            )?;
            Ok(())
        })
    }

    pub fn list_cache_keys(&self) -> Result<Vec<CacheKey>> {
        let raw_keys: Vec<String> = self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key_json FROM cache_entries ORDER BY storage_key")?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .filter_map(|r| r.ok())
                .collect();
            Ok(keys)
        })?;

        Ok(raw_keys
            .iter()
            .filter_map(|json| match serde_json::from_str::<CacheKey>(json) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(error = %e, "Unreadable cache key, ignoring");
                    None
                }
            })
            .collect())
    }

    /// Delete entries stored before `cutoff`. Returns how many were removed.
    pub fn prune_cache_entries_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM cache_entries WHERE stored_at < ?1",
                [cutoff.to_rfc3339()],
            )?;
            Ok(removed)
        })
    }

    pub fn clear_cache_entries(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM cache_entries", [])?;
            Ok(())
        })
    }
}

struct RawEntry {
    value_json: String,
    stale: bool,
    stored_at: String,
}

fn row_to_raw_entry(row: &Row) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        value_json: row.get("value_json")?,
        stale: row.get::<_, i64>("stale")? != 0,
        stored_at: row.get("stored_at")?,
    })
}
