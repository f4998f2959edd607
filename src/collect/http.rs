// src/collect/http.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::collect::{FetchedReaction, ReactionSource, SearchQuery};
use crate::config::SearchCfg;

/// Search endpoint answering `GET <url>?q=..&count=..&lang=..[&max_id=..][&since_id=..]`
/// with JSON hits, newest first.
#[derive(Clone)]
pub struct HttpSearchSource {
    url: String,
    lang: String,
    token: Option<String>,
    client: Client,
    timeout: Duration,
}

/// Either `{"statuses": [...]}` or a bare array of hits.
#[derive(Deserialize)]
#[serde(untagged)]
enum SearchBody {
    Wrapped { statuses: Vec<FetchedReaction> },
    Bare(Vec<FetchedReaction>),
}

impl HttpSearchSource {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            lang: "en".to_string(),
            token: None,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Source for the configured endpoint, `None` when no URL is set.
    pub fn from_config(cfg: &SearchCfg) -> Option<Self> {
        let url = cfg.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        let mut src = Self::from_url(url)
            .with_lang(&cfg.lang)
            .with_timeout(cfg.timeout_secs);
        if let Some(token) = cfg.token() {
            src = src.with_token(token);
        }
        Some(src)
    }

    pub fn with_lang(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query-string pairs for one page.
    pub fn params(&self, q: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut p = vec![
            ("q", q.term.clone()),
            ("count", q.count.to_string()),
            ("lang", self.lang.clone()),
        ];
        if let Some(m) = q.max_id {
            p.push(("max_id", m.to_string()));
        }
        if let Some(s) = q.since_id {
            p.push(("since_id", s.to_string()));
        }
        p
    }

    /// Parse a search response body.
    pub fn parse(body: &str) -> Result<Vec<FetchedReaction>> {
        let parsed: SearchBody =
            serde_json::from_str(body).context("parsing search response json")?;
        Ok(match parsed {
            SearchBody::Wrapped { statuses } => statuses,
            SearchBody::Bare(hits) => hits,
        })
    }
}

#[async_trait]
impl ReactionSource for HttpSearchSource {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<FetchedReaction>> {
        let mut req = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .query(&self.params(query));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let body = req
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("searching {} for `{}`", self.url, query.term))?
            .text()
            .await
            .with_context(|| format!("reading search body from {}", self.url))?;
        Self::parse(&body)
    }

    fn name(&self) -> &str {
        "http-search"
    }
}
