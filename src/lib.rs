// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod config;
pub mod metrics;
pub mod telemetry;
pub mod text;

// Core: term significance and reaction timelines
pub mod corpus;
pub mod headline;
pub mod reaction;
pub mod sargs;
pub mod sentiment;
pub mod tfidf;
pub mod timeline;

// Collaborators: feed ingest and reaction collection
pub mod collect;
pub mod ingest;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::corpus::{Corpus, CorpusSnapshot, CorpusSource};
pub use crate::headline::{Headline, HeadlineStore};
pub use crate::reaction::Reaction;
pub use crate::sargs::select_sargs;
pub use crate::tfidf::{score_headline, TermScore};
pub use crate::timeline::{summarize_reactions, Granularity, Summary, TimeSeries};
