//! Fan-out/fan-in over the head of the ranking list.
//!
//! One task per id in the working window resolves its item through the shared
//! [`ItemFetcher`]. Tasks finish in any order, so every outcome carries the rank it was
//! dispatched with and the survivors are sorted by it before truncation.

use std::collections::HashMap;

use crate::error::FetchError;
use crate::fetcher::ItemFetcher;
use crate::item::{Item, ItemId, PostType};

pub(crate) const DEFAULT_LIMIT: usize = 30;
/// Larger than the limit to absorb jobs, Ask HNs and failed lookups. Not a guarantee.
pub(crate) const DEFAULT_WINDOW: usize = 40;

#[derive(Debug)]
pub(crate) enum SkipReason {
    Fetch(FetchError),
    NotAStory(PostType),
    NoUrl,
    /// The lookup task panicked or was cancelled.
    TaskFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Fetch(e) => write!(f, "fetch failed: {e}"),
            SkipReason::NotAStory(post_type) => write!(f, "not a story ({post_type})"),
            SkipReason::NoUrl => write!(f, "story has no url"),
            SkipReason::TaskFailed(e) => write!(f, "lookup task failed: {e}"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Skipped {
    pub(crate) id: ItemId,
    pub(crate) rank: usize,
    pub(crate) reason: SkipReason,
}

#[derive(Debug)]
pub(crate) enum Outcome {
    Story(Item),
    Skipped(Skipped),
}

/// Result of one aggregation pass.
#[derive(Debug, Default)]
pub(crate) struct TopStories {
    /// Qualifying items, ascending by rank, at most `limit` long.
    pub(crate) stories: Vec<Item>,
    /// Items of the window that were looked up but left out, ascending by rank.
    pub(crate) skipped: Vec<Skipped>,
    /// Length of the full ranking list.
    pub(crate) num_candidates: usize,
    /// Number of ids dispatched for lookup.
    pub(crate) num_dispatched: usize,
}

#[derive(Clone)]
pub(crate) struct Aggregator {
    fetcher: ItemFetcher,
    window: usize,
}

impl Aggregator {
    pub(crate) fn new(fetcher: ItemFetcher, window: usize) -> Self {
        Self { fetcher, window }
    }

    /// Ordered top stories. Fails only when the ranking list cannot be fetched.
    pub(crate) async fn get_top_stories(&self, limit: usize) -> Result<Vec<Item>, FetchError> {
        Ok(self.collect(limit).await?.stories)
    }

    /// Same as [`Aggregator::get_top_stories`], keeping the skip records.
    pub(crate) async fn collect(&self, limit: usize) -> Result<TopStories, FetchError> {
        let ids = self.fetcher.fetch_top_ids().await?;
        let num_candidates = ids.len();

        let mut join_set: tokio::task::JoinSet<Outcome> = tokio::task::JoinSet::new();
        // A panicked task only reports its task id, so keep what it was looking up.
        let mut dispatched: HashMap<tokio::task::Id, (ItemId, usize)> = HashMap::new();

        for (rank, id) in ids.into_iter().take(self.window).enumerate() {
            let fetcher = self.fetcher.clone();
            let handle = join_set.spawn(async move { lookup(&fetcher, id, rank).await });
            dispatched.insert(handle.id(), (id, rank));
        }
        let num_dispatched = dispatched.len();

        let mut stories = Vec::with_capacity(num_dispatched);
        let mut skipped = Vec::new();

        // Drains until every task has reported, so nothing is dropped.
        while let Some(res) = join_set.join_next_with_id().await {
            match res {
                Ok((_, Outcome::Story(item))) => stories.push(item),
                Ok((_, Outcome::Skipped(skip))) => {
                    if let SkipReason::Fetch(e) = &skip.reason {
                        tracing::warn!(id = skip.id, rank = skip.rank, error = %e, "Skipping item");
                    } else {
                        tracing::debug!(
                            id = skip.id,
                            rank = skip.rank,
                            reason = %skip.reason,
                            "Item does not qualify"
                        );
                    }
                    skipped.push(skip);
                }
                Err(e) => {
                    let Some(&(id, rank)) = dispatched.get(&e.id()) else {
                        tracing::error!(error =? e, "Unknown lookup task failed");
                        continue;
                    };
                    tracing::error!(id, rank, error =? e, "Item lookup task failed");
                    skipped.push(Skipped {
                        id,
                        rank,
                        reason: SkipReason::TaskFailed(e.to_string()),
                    });
                }
            }
        }

        stories.sort_by_key(|item| item.rank);
        stories.truncate(limit);
        skipped.sort_by_key(|skip| skip.rank);

        if stories.len() < limit {
            tracing::warn!(
                limit,
                num_stories = stories.len(),
                window = self.window,
                "Fewer qualifying stories than requested in window"
            );
        }

        tracing::info!(
            num_candidates,
            num_dispatched,
            num_stories = stories.len(),
            num_skipped = skipped.len(),
            "Collected top stories"
        );

        Ok(TopStories {
            stories,
            skipped,
            num_candidates,
            num_dispatched,
        })
    }
}

async fn lookup(fetcher: &ItemFetcher, id: ItemId, rank: usize) -> Outcome {
    let skip = |reason| Outcome::Skipped(Skipped { id, rank, reason });

    let mut item = match fetcher.fetch_item(id).await {
        Ok(item) => item,
        Err(e) => return skip(SkipReason::Fetch(e)),
    };

    if !item.qualifies() {
        return skip(match item.post_type {
            PostType::Story => SkipReason::NoUrl,
            other => SkipReason::NotAStory(other),
        });
    }

    item.rank = rank;
    Outcome::Story(item)
}
