use std::sync::Arc;

use crate::cache::ItemCache;
use crate::error::FetchError;
use crate::hn_api::Upstream;
use crate::item::{Item, ItemId};

/// Resolves item ids, serving from the cache when it can. Clones share the upstream and
/// the cache, so one fetcher can be handed to every task of a fan-out.
#[derive(Clone)]
pub(crate) struct ItemFetcher {
    upstream: Arc<dyn Upstream>,
    cache: ItemCache,
}

impl ItemFetcher {
    pub(crate) fn new(upstream: Arc<dyn Upstream>, cache: ItemCache) -> Self {
        Self { upstream, cache }
    }

    pub(crate) async fn fetch_top_ids(&self) -> Result<Vec<ItemId>, FetchError> {
        self.upstream.top_story_ids().await
    }

    /// Cache first, then the network. Only successful fetches are cached.
    ///
    /// Two concurrent calls for the same uncached id both go to the network and both write
    /// the cache; the second write wins.
    pub(crate) async fn fetch_item(&self, id: ItemId) -> Result<Item, FetchError> {
        if let Some(item) = self.cache.get(id) {
            tracing::trace!(id, "Item cache hit");
            return Ok(item);
        }

        let item = self.upstream.item(id).await?;
        self.cache.set(id, item.clone());
        Ok(item)
    }
}
