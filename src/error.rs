//! Errors raised while talking to the upstream ranking API.
//!
//! The variants separate the failure kinds for diagnostics only. Callers treat them
//! the same way: the ranking request fails as a whole, an item request is skipped.

use crate::item::ItemId;

#[derive(Debug, thiserror::Error)]
pub(crate) enum FetchError {
    /// Connection, timeout or body read failure.
    #[error("upstream unavailable at {url}: {source}")]
    Unavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed payload from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The item endpoint answered `null`: the id was never assigned or has been deleted.
    #[error("item {0} does not exist upstream")]
    Missing(ItemId),
}
