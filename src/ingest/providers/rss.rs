// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::normalize_text;
use crate::ingest::types::{FeedItem, FeedProvider};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

pub(crate) fn parse_rfc2822_to_unix(ts: &str) -> Option<i64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
}

#[derive(Debug, Clone)]
enum Origin {
    Url(String),
    Fixture(String),
}

/// RSS 2.0 feed, fetched over HTTP or parsed from in-memory XML.
pub struct RssFeedProvider {
    source: String,
    origin: Origin,
    client: reqwest::Client,
}

impl RssFeedProvider {
    pub fn from_url(source: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            origin: Origin::Url(url.into()),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_fixture(source: impl Into<String>, content: &str) -> Self {
        Self {
            source: source.into(),
            origin: Origin::Fixture(content.to_string()),
            client: reqwest::Client::new(),
        }
    }

    async fn body(&self) -> Result<String> {
        match &self.origin {
            Origin::Fixture(s) => Ok(s.clone()),
            Origin::Url(url) => self
                .client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .with_context(|| format!("fetching feed {url}"))?
                .text()
                .await
                .with_context(|| format!("reading feed body {url}")),
        }
    }

    /// Parse RSS XML into feed items for `source`.
    pub fn parse(source: &str, xml: &str) -> Result<Vec<FeedItem>> {
        let rss: Rss = from_str(xml).with_context(|| format!("parsing {source} rss xml"))?;
        let mut out = Vec::with_capacity(rss.channel.item.len());

        for it in rss.channel.item {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            out.push(FeedItem {
                source: source.to_string(),
                title,
                link: it.link,
                published: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl FeedProvider for RssFeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<FeedItem>> {
        let xml = self.body().await?;
        Self::parse(&self.source, &xml)
    }

    fn name(&self) -> &str {
        &self.source
    }
}
