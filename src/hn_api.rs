use crate::error::FetchError;
use crate::item::{Item, ItemId};

pub(crate) const DEFAULT_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

/// The two upstream endpoints the pipeline reads from.
#[async_trait::async_trait]
pub(crate) trait Upstream: Send + Sync {
    /// Ranked candidate ids from `topstories.json`. Never cached.
    async fn top_story_ids(&self) -> Result<Vec<ItemId>, FetchError>;

    /// A single record from `item/{id}.json`.
    async fn item(&self, id: ItemId) -> Result<Item, FetchError>;
}

#[derive(Debug, Clone)]
pub(crate) struct HnClient {
    client: reqwest::Client,
    api_base: String,
}

impl HnClient {
    pub(crate) fn new(api_base: &str, request_timeout: std::time::Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Issues a GET and decodes the whole body as `T`. Each failure stage maps to its own variant.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(source) => return Err(FetchError::Unavailable { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(source) => return Err(FetchError::Unavailable { url, source }),
        };

        serde_json::from_slice(&body).map_err(|source| FetchError::Malformed { url, source })
    }
}

#[async_trait::async_trait]
impl Upstream for HnClient {
    async fn top_story_ids(&self) -> Result<Vec<ItemId>, FetchError> {
        let ids: Vec<ItemId> = self
            .get_json(format!("{}/topstories.json", self.api_base))
            .await?;

        tracing::debug!(num_ids = ids.len(), "Got top story ids");
        Ok(ids)
    }

    async fn item(&self, id: ItemId) -> Result<Item, FetchError> {
        // Unknown and deleted ids come back as a literal `null`.
        let item: Option<Item> = self
            .get_json(format!("{}/item/{}.json", self.api_base, id))
            .await?;

        item.ok_or(FetchError::Missing(id))
    }
}
