// src/config.rs
//! Service configuration from TOML with env overrides.
//!
//! ```toml
//! [sargs]
//! cutoff = 0.1            # omit for the adaptive median cutoff
//!
//! [ingest]
//! interval_secs = 900
//! retention_days = 7
//! refresh_corpus_after_ingest = true
//! [[ingest.feeds]]
//! source = "nyt"
//! url = "http://rss.nytimes.com/services/xml/rss/nyt/World.xml"
//!
//! [collect]
//! max_reactions = 1000
//! per_query = 100
//!
//! [search]
//! url = "https://search.example.com/1.1/search.json"   # omit to disable collection
//! lang = "en"
//! timeout_secs = 10
//! token_env = "PULSE_SEARCH_TOKEN"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/pulse.toml";

pub const ENV_CONFIG_PATH: &str = "PULSE_CONFIG_PATH";
pub const ENV_SARG_CUTOFF: &str = "PULSE_SARG_CUTOFF";
pub const ENV_RETENTION_DAYS: &str = "PULSE_RETENTION_DAYS";
pub const ENV_SEARCH_URL: &str = "PULSE_SEARCH_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PulseConfig {
    #[serde(default)]
    pub sargs: SargsCfg,
    #[serde(default)]
    pub ingest: IngestCfg,
    #[serde(default)]
    pub collect: CollectCfg,
    #[serde(default)]
    pub search: SearchCfg,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SargsCfg {
    #[serde(default)]
    pub cutoff: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestCfg {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
    #[serde(default = "default_true")]
    pub refresh_corpus_after_ingest: bool,
    #[serde(default)]
    pub feeds: Vec<FeedCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedCfg {
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CollectCfg {
    #[serde(default = "default_max_reactions")]
    pub max_reactions: usize,
    #[serde(default = "default_per_query")]
    pub per_query: usize,
}

/// Reaction search endpoint. Collection is disabled while `url` is unset.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchCfg {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
    /// Name of the env var holding the bearer token, if any.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl SearchCfg {
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

impl Default for SearchCfg {
    fn default() -> Self {
        Self {
            url: None,
            lang: default_lang(),
            timeout_secs: default_search_timeout_secs(),
            token_env: default_token_env(),
        }
    }
}

fn default_lang() -> String {
    "en".to_string()
}
fn default_search_timeout_secs() -> u64 {
    10
}
fn default_token_env() -> String {
    "PULSE_SEARCH_TOKEN".to_string()
}

fn default_interval_secs() -> u64 {
    900
}
fn default_retention_days() -> u64 {
    7
}
fn default_true() -> bool {
    true
}
fn default_max_reactions() -> usize {
    1000
}
fn default_per_query() -> usize {
    100
}

impl Default for IngestCfg {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            retention_days: default_retention_days(),
            refresh_corpus_after_ingest: true,
            feeds: Vec::new(),
        }
    }
}

impl Default for CollectCfg {
    fn default() -> Self {
        Self {
            max_reactions: default_max_reactions(),
            per_query: default_per_query(),
        }
    }
}

impl IngestCfg {
    pub fn retention_secs(&self) -> i64 {
        (self.retention_days as i64).saturating_mul(86_400)
    }
}

impl PulseConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pulse config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing pulse config at {}", path.display()))
    }

    /// Resolve the config:
    /// 1) $PULSE_CONFIG_PATH (must exist)
    /// 2) config/pulse.toml if present
    /// 3) built-in defaults
    ///
    /// Env overrides are applied last.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from(&PathBuf::from(p))?,
            Err(_) => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from(&p)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(ENV_SARG_CUTOFF) {
            if let Some(c) = parse_cutoff_env(&raw) {
                self.sargs.cutoff = c;
            }
        }
        if let Some(days) = std::env::var(ENV_RETENTION_DAYS)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            self.ingest.retention_days = days;
        }
        if let Ok(url) = std::env::var(ENV_SEARCH_URL) {
            let url = url.trim();
            if !url.is_empty() {
                self.search.url = Some(url.to_string());
            }
        }
    }
}

/// `Some(None)` switches to the adaptive median, `Some(Some(x))` fixes the cutoff,
/// `None` means the value was unusable and is ignored.
fn parse_cutoff_env(raw: &str) -> Option<Option<f64>> {
    let t = raw.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("median") {
        return Some(None);
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some)
}
