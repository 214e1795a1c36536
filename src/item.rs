pub(crate) type ItemId = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PostType {
    Story,
    Comment,
    Job,
    Poll,
    Pollopt,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostType::Story => write!(f, "story"),
            PostType::Comment => write!(f, "comment"),
            PostType::Job => write!(f, "job"),
            PostType::Poll => write!(f, "poll"),
            PostType::Pollopt => write!(f, "pollopt"),
            PostType::Unknown => write!(f, "unknown"),
        }
    }
}

/// One record from the `item/{id}.json` endpoint. Only the fields we render are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub(crate) struct Item {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) id: ItemId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) url: String,

    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub(crate) post_type: PostType,

    // Not part of the upstream record. Position in the ranking list, set by the aggregator.
    #[serde(skip_deserializing)]
    pub(crate) rank: usize,
}

impl Item {
    /// Only stories that link somewhere make it into the list.
    pub(crate) fn qualifies(&self) -> bool {
        self.post_type == PostType::Story && !self.url.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    Ok(<Option<T> as serde::Deserialize>::deserialize(deserializer)?.unwrap_or_default())
}
