//! Time-limited cache of prepared tables.
//!
//! One entry per cache token (the source description). Entries expire after
//! the configured time-to-live and are dropped explicitly on refresh.

use crate::models::PreparedTable;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Identifies one cached load, e.g. `workbook:REPORT/ORDER_SHEET`
pub type CacheToken = String;

#[derive(Clone)]
pub struct TableCache {
    entries: Cache<CacheToken, Arc<PreparedTable>>,
}

impl std::fmt::Debug for TableCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl TableCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().max_capacity(16).time_to_live(ttl).build(),
        }
    }

    pub fn get(&self, token: &str) -> Option<Arc<PreparedTable>> {
        let hit = self.entries.get(token);
        debug!(
            "Cache {} for '{}'",
            if hit.is_some() { "hit" } else { "miss" },
            token
        );
        hit
    }

    pub fn insert(&self, token: impl Into<CacheToken>, table: Arc<PreparedTable>) {
        self.entries.insert(token.into(), table);
    }

    pub fn invalidate(&self, token: &str) {
        debug!("Invalidating cached table '{}'", token);
        self.entries.invalidate(token);
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_invalidate() {
        let cache = TableCache::new(Duration::from_secs(60));
        let table = Arc::new(PreparedTable {
            headers: vec!["ORD WT".to_string()],
            ..Default::default()
        });

        assert!(cache.get("fixture").is_none());

        cache.insert("fixture", Arc::clone(&table));
        let cached = cache.get("fixture").unwrap();
        assert!(Arc::ptr_eq(&cached, &table));
        assert!(cache.get("workbook:other").is_none());

        cache.invalidate("fixture");
        assert!(cache.get("fixture").is_none());
    }

    #[test]
    fn test_expired_entries_are_not_returned() {
        let cache = TableCache::new(Duration::from_millis(20));
        cache.insert("fixture", Arc::new(PreparedTable::default()));

        std::thread::sleep(Duration::from_millis(60));

        assert!(cache.get("fixture").is_none());
    }
}
