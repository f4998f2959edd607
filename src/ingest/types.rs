// src/ingest/types.rs
use anyhow::Result;

/// One raw entry from a news feed, before cleaning.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub source: String, // e.g., "nyt", "reuters"
    pub title: String,  // normalized title text
    pub link: Option<String>,
    /// Unix seconds; `None` when the feed date was missing or unparsable.
    pub published: Option<i64>,
}

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<FeedItem>>;
    fn name(&self) -> &str;
}
