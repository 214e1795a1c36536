//! Time-expiring item cache shared by every fetch task.
//!
//! Entries expire `ttl` after they are written. Expired entries are never served, and a
//! background sweeper removes them from memory once per sweep interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::item::{Item, ItemId};

#[derive(Debug)]
struct Entry {
    item: Item,
    inserted_at: Instant,
}

impl Entry {
    // Compared as elapsed time so any ttl, however large, is valid.
    fn is_live(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }
}

#[derive(Debug)]
struct Storage {
    entries: dashmap::DashMap<ItemId, Entry>,
    ttl: Duration,
}

impl Storage {
    fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(self.ttl, now));
        before.saturating_sub(self.entries.len())
    }
}

/// Cheap to clone; clones share the same entries.
#[derive(Debug, Clone)]
pub(crate) struct ItemCache {
    storage: Arc<Storage>,
}

impl ItemCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            storage: Arc::new(Storage {
                entries: dashmap::DashMap::new(),
                ttl,
            }),
        }
    }

    /// Returns a copy of the cached item, or `None` if absent or expired.
    pub(crate) fn get(&self, id: ItemId) -> Option<Item> {
        let now = Instant::now();
        self.storage
            .entries
            .get(&id)
            .filter(|entry| entry.is_live(self.storage.ttl, now))
            .map(|entry| entry.item.clone())
    }

    /// Stores `item` under `id` with the default expiration, replacing any previous entry.
    pub(crate) fn set(&self, id: ItemId, item: Item) {
        let inserted_at = Instant::now();
        self.storage.entries.insert(id, Entry { item, inserted_at });
    }

    /// Number of stored entries, including expired ones the sweeper has not removed yet.
    pub(crate) fn len(&self) -> usize {
        self.storage.entries.len()
    }

    /// Spawns the sweeper on the current runtime. It stops on its own once every clone
    /// of the cache has been dropped.
    pub(crate) fn start_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let storage = Arc::downgrade(&self.storage);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(storage) = storage.upgrade() else {
                    tracing::debug!("Item cache dropped, stopping sweeper");
                    break;
                };

                let purged = storage.purge_expired();
                if purged > 0 {
                    tracing::debug!(
                        purged,
                        remaining = storage.entries.len(),
                        "Swept expired items from cache"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: ItemId, title: &str) -> Item {
        Item {
            id,
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_and_set() {
        let cache = ItemCache::new(Duration::from_secs(60));

        assert_eq!(cache.get(1), None);
        cache.set(1, item(1, "first"));
        assert_eq!(cache.get(1), Some(item(1, "first")));
        assert_eq!(cache.get(2), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_independent_copy() {
        let cache = ItemCache::new(Duration::from_secs(60));
        cache.set(1, item(1, "original"));

        let mut copy = cache.get(1).unwrap();
        copy.title = "changed".to_string();
        copy.rank = 12;

        assert_eq!(cache.get(1), Some(item(1, "original")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ItemCache::new(Duration::from_secs(60));
        cache.set(1, item(1, "first"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get(1).is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(1), None);
        // Not served, but still held until swept.
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_ttl_never_expires() {
        let cache = ItemCache::new(Duration::from_secs(u64::MAX));
        cache.set(1, item(1, "forever"));

        tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;
        assert_eq!(cache.get(1), Some(item(1, "forever")));
        assert_eq!(cache.storage.purge_expired(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_is_never_served() {
        let cache = ItemCache::new(Duration::ZERO);
        cache.set(1, item(1, "gone"));

        assert_eq!(cache.get(1), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_after_expiry_overwrites() {
        let cache = ItemCache::new(Duration::from_secs(60));
        cache.set(1, item(1, "old"));

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.set(1, item(1, "new"));

        assert_eq!(cache.get(1), Some(item(1, "new")));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_keeps_live_entries() {
        let cache = ItemCache::new(Duration::from_secs(60));
        cache.set(1, item(1, "old"));
        tokio::time::advance(Duration::from_secs(30)).await;
        cache.set(2, item(2, "young"));
        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(cache.storage.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(2).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_within_interval() {
        let cache = ItemCache::new(Duration::from_secs(60));
        let _sweeper = cache.start_sweeper(Duration::from_secs(120));
        cache.set(1, item(1, "first"));

        // Expired at 60s, the sweep at 120s removes it.
        tokio::time::sleep(Duration::from_secs(121)).await;
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_when_cache_dropped() {
        let cache = ItemCache::new(Duration::from_secs(60));
        let sweeper = cache.start_sweeper(Duration::from_secs(10));
        drop(cache);

        tokio::time::timeout(Duration::from_secs(30), sweeper)
            .await
            .expect("sweeper to stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_set_and_get() {
        let cache = ItemCache::new(Duration::from_secs(60));
        let mut join_set = tokio::task::JoinSet::new();

        for id in 0..64 {
            let cache = cache.clone();
            join_set.spawn(async move {
                cache.set(id, item(id, "concurrent"));
                cache.get(id)
            });
        }

        while let Some(res) = join_set.join_next().await {
            assert!(res.unwrap().is_some());
        }
        assert_eq!(cache.len(), 64);
    }
}
