//! In-memory `Upstream` used by the fetcher, aggregator and server tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::FetchError;
use crate::hn_api::Upstream;
use crate::item::{Item, ItemId, PostType};

#[derive(Debug)]
pub(crate) enum Canned {
    Item(Item),
    StatusError(u16),
    Malformed,
    Missing,
    /// The lookup panics instead of returning.
    Panic,
}

#[derive(Debug, Default)]
pub(crate) struct FakeUpstream {
    /// `None` makes `top_story_ids` fail with a 503.
    pub(crate) top_ids: Option<Vec<ItemId>>,
    pub(crate) items: HashMap<ItemId, Canned>,
    pub(crate) delays: HashMap<ItemId, Duration>,
    top_ids_calls: AtomicUsize,
    item_calls: Mutex<HashMap<ItemId, usize>>,
}

pub(crate) fn story(id: ItemId) -> Item {
    Item {
        id,
        title: format!("Story {id}"),
        url: format!("https://example.com/{id}"),
        post_type: PostType::Story,
        ..Default::default()
    }
}

fn status_error(url: String, code: u16) -> FetchError {
    FetchError::Status {
        url,
        status: reqwest::StatusCode::from_u16(code).unwrap(),
    }
}

impl FakeUpstream {
    /// Every id in `ids` resolves to a qualifying story.
    pub(crate) fn with_stories(ids: &[ItemId]) -> Self {
        let mut upstream = Self {
            top_ids: Some(ids.to_vec()),
            ..Default::default()
        };
        for &id in ids {
            upstream.items.insert(id, Canned::Item(story(id)));
        }
        upstream
    }

    pub(crate) fn failing_top_ids() -> Self {
        Self::default()
    }

    pub(crate) fn set(&mut self, id: ItemId, canned: Canned) {
        self.items.insert(id, canned);
    }

    pub(crate) fn delay(&mut self, id: ItemId, delay: Duration) {
        self.delays.insert(id, delay);
    }

    pub(crate) fn top_ids_calls(&self) -> usize {
        self.top_ids_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn item_calls(&self, id: ItemId) -> usize {
        self.item_calls.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    pub(crate) fn total_item_calls(&self) -> usize {
        self.item_calls.lock().unwrap().values().sum()
    }
}

#[async_trait::async_trait]
impl Upstream for FakeUpstream {
    async fn top_story_ids(&self) -> Result<Vec<ItemId>, FetchError> {
        self.top_ids_calls.fetch_add(1, Ordering::SeqCst);
        self.top_ids
            .clone()
            .ok_or_else(|| status_error("fake://topstories.json".to_string(), 503))
    }

    async fn item(&self, id: ItemId) -> Result<Item, FetchError> {
        *self.item_calls.lock().unwrap().entry(id).or_insert(0) += 1;

        if let Some(delay) = self.delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }

        let url = format!("fake://item/{id}.json");
        match self.items.get(&id) {
            Some(Canned::Item(item)) => Ok(item.clone()),
            Some(Canned::StatusError(code)) => Err(status_error(url, *code)),
            Some(Canned::Malformed) => Err(FetchError::Malformed {
                url,
                source: serde_json::from_str::<Item>("not json").unwrap_err(),
            }),
            Some(Canned::Missing) | None => Err(FetchError::Missing(id)),
            Some(Canned::Panic) => panic!("lookup of item {id} blew up"),
        }
    }
}
