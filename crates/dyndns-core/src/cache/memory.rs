// # Memory Cache Store
//
// In-memory implementation of CacheStore.
//
// ## Purpose
//
// Holds the descriptors for the lifetime of the process only. Useful when
// the library is embedded in a longer-lived program, and in tests.
//
// ## Crash Behavior
//
// - All entries are lost on exit
// - The next run starts with a miss and performs the remote lookups

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::cache_store::{CacheEntry, CacheKind, CacheLookup, CacheStore};

/// In-memory cache store implementation
///
/// Clones share the same entries.
///
/// # Example
///
/// ```rust,no_run
/// use dyndns_core::cache::MemoryCacheStore;
/// use dyndns_core::traits::{CacheLookup, CacheStore, ZoneDescriptor};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryCacheStore::new();
///     store.write(&ZoneDescriptor::new("z1", "example.com").into()).await?;
///
///     let zone = store.read_zone().await;
///     assert_eq!(zone, CacheLookup::Hit(ZoneDescriptor::new("z1", "example.com")));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryCacheStore {
    inner: Arc<RwLock<HashMap<CacheKind, CacheEntry>>>,
}

impl MemoryCacheStore {
    /// Create a new empty memory cache store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a store pre-populated with `entries`
    pub fn with_entries(entries: impl IntoIterator<Item = CacheEntry>) -> Self {
        let map = entries
            .into_iter()
            .map(|entry| (entry.kind(), entry))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Get the number of entries in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Current entry of `kind`, if any
    pub async fn get(&self, kind: CacheKind) -> Option<CacheEntry> {
        self.inner.read().await.get(&kind).cloned()
    }

    /// Remove all entries
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn read(&self, kind: CacheKind) -> CacheLookup<CacheEntry> {
        match self.inner.read().await.get(&kind) {
            Some(entry) => CacheLookup::Hit(entry.clone()),
            None => CacheLookup::Miss,
        }
    }

    async fn write(&self, entry: &CacheEntry) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(entry.kind(), entry.clone());
        Ok(())
    }

    async fn ensure_ready(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn invalidate(&self, kind: CacheKind) -> Result<(), Error> {
        self.inner.write().await.remove(&kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::dns_directory::{RecordDescriptor, ZoneDescriptor};

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryCacheStore::new();

        assert!(store.is_empty().await);
        assert_eq!(store.read_zone().await, CacheLookup::Miss);

        let zone = ZoneDescriptor::new("z1", "example.com");
        store.write(&zone.clone().into()).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.read_zone().await, CacheLookup::Hit(zone));
        assert_eq!(store.read_record().await, CacheLookup::Miss);

        store.clear().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_one_entry_per_kind() {
        let record = RecordDescriptor {
            id: "rec1".to_string(),
            name: "home".to_string(),
            value: "1.2.3.4".to_string(),
            zone_id: "z1".to_string(),
            ttl: None,
        };
        let store = MemoryCacheStore::with_entries([
            CacheEntry::from(ZoneDescriptor::new("z1", "old.com")),
            CacheEntry::from(record.clone()),
        ]);

        store
            .write(&ZoneDescriptor::new("z2", "example.com").into())
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(
            store.get(CacheKind::Zone).await,
            Some(CacheEntry::Zone(ZoneDescriptor::new("z2", "example.com")))
        );
        assert_eq!(store.read_record().await, CacheLookup::Hit(record));

        store.invalidate(CacheKind::Record).await.unwrap();
        store.invalidate(CacheKind::Record).await.unwrap();
        assert_eq!(store.read_record().await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryCacheStore::new();
        let clone = store.clone();

        clone
            .write(&ZoneDescriptor::new("z1", "example.com").into())
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }
}
