use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::collect::{
    collect_reactions, CollectReport, HttpSearchSource, ReactionSource, ReactionStore,
};
use crate::config::{CollectCfg, PulseConfig};
use crate::corpus::Corpus;
use crate::headline::{Headline, HeadlineStore};
use crate::reaction::Reaction;
use crate::sargs::{sargs_for_tokens, sargs_query};
use crate::sentiment::{headline_intensity, LexiconPolarity, PolarityScorer};
use crate::text::clean_headline;
use crate::tfidf::TermScore;
use crate::timeline::{summarize_reactions_with, ReactionReport};

type ApiError = (StatusCode, String);

#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<Corpus>,
    pub headlines: Arc<HeadlineStore>,
    pub reactions: Arc<ReactionStore>,
    pub polarity: Arc<dyn PolarityScorer>,
    /// `None` selects sargs with the adaptive median cutoff.
    pub sarg_cutoff: Option<f64>,
    /// `None` while no search endpoint is configured.
    pub reaction_source: Option<Arc<dyn ReactionSource>>,
    pub collect: CollectCfg,
}

impl AppState {
    /// State over `headlines`, with the corpus built lazily from the same store.
    pub fn new(headlines: Arc<HeadlineStore>, cfg: &PulseConfig) -> Self {
        Self {
            corpus: Arc::new(Corpus::new(headlines.clone())),
            headlines,
            reactions: Arc::new(ReactionStore::new()),
            polarity: Arc::new(LexiconPolarity::new()),
            sarg_cutoff: cfg.sargs.cutoff,
            reaction_source: HttpSearchSource::from_config(&cfg.search)
                .map(|s| Arc::new(s) as Arc<dyn ReactionSource>),
            collect: cfg.collect,
        }
    }

    pub fn with_reaction_source(mut self, source: Arc<dyn ReactionSource>) -> Self {
        self.reaction_source = Some(source);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/sargs", post(sargs_from_body))
        .route("/headlines", get(headlines_for_day))
        .route("/headlines/{id}/sargs", get(sargs_for_headline))
        .route("/headlines/{id}/summary", get(summary_for_headline))
        .route("/headlines/{id}/collect", post(collect_for_headline))
        .route("/summary", post(summary_from_body))
        .route("/admin/refresh-corpus", post(admin_refresh_corpus))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct SargsReq {
    #[serde(default)]
    tokens: Option<Vec<String>>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    cutoff: Option<f64>,
}

#[derive(Serialize)]
struct SargsResp {
    sargs: Vec<TermScore>,
    query: String,
}

fn sargs_response(state: &AppState, tokens: &[String], cutoff: Option<f64>) -> SargsResp {
    let snap = state.corpus.snapshot();
    let sargs = sargs_for_tokens(tokens, &snap, cutoff.or(state.sarg_cutoff));
    let query = sargs_query(&sargs);
    SargsResp { sargs, query }
}

async fn sargs_from_body(
    State(state): State<AppState>,
    Json(body): Json<SargsReq>,
) -> Result<Json<SargsResp>, ApiError> {
    let tokens = match (body.tokens, body.text) {
        (Some(t), _) => t,
        (None, Some(text)) => clean_headline(&text),
        (None, None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "either `tokens` or `text` is required".to_string(),
            ))
        }
    };
    Ok(Json(sargs_response(&state, &tokens, body.cutoff)))
}

#[derive(Deserialize)]
struct CutoffQuery {
    #[serde(default)]
    cutoff: Option<f64>,
}

async fn sargs_for_headline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<CutoffQuery>,
) -> Result<Json<SargsResp>, ApiError> {
    let headline = find_headline(&state, &id)?;
    Ok(Json(sargs_response(&state, &headline.tokens, q.cutoff)))
}

#[derive(Deserialize)]
struct DayQuery {
    date: String,
}

/// Listed headline with how emotionally loaded its text is.
#[derive(Serialize)]
struct HeadlineView {
    #[serde(flatten)]
    headline: Headline,
    intensity: f64,
}

async fn headlines_for_day(
    State(state): State<AppState>,
    Query(q): Query<DayQuery>,
) -> Result<Json<Vec<HeadlineView>>, ApiError> {
    let day = NaiveDate::parse_from_str(q.date.trim(), "%Y-%m-%d").map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid date `{}`: {e}", q.date),
        )
    })?;
    let views = state
        .headlines
        .for_day(day)
        .into_iter()
        .map(|headline| HeadlineView {
            intensity: headline_intensity(state.polarity.as_ref(), &headline.text),
            headline,
        })
        .collect();
    Ok(Json(views))
}

#[derive(Deserialize)]
struct TermQuery {
    term: String,
}

async fn summary_for_headline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<TermQuery>,
) -> Result<Json<ReactionReport>, ApiError> {
    let headline = find_headline(&state, &id)?;
    let reactions = state.reactions.for_pair(&headline.id, &q.term);
    let summary =
        summarize_reactions_with(&headline, &reactions, &q.term, state.polarity.as_ref());
    Ok(Json(summary.to_report()))
}

#[derive(Deserialize)]
struct CollectQuery {
    #[serde(default)]
    term: Option<String>,
}

#[derive(Serialize)]
struct CollectResp {
    search_term: String,
    #[serde(flatten)]
    report: CollectReport,
}

/// Run one collection pass for a stored headline. Without `term`, the
/// headline's own sargs form the search string.
async fn collect_for_headline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<CollectQuery>,
) -> Result<Json<CollectResp>, ApiError> {
    let headline = find_headline(&state, &id)?;
    let Some(source) = state.reaction_source.clone() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "no reaction search endpoint configured".to_string(),
        ));
    };
    let term = match q.term.map(|t| t.trim().to_string()) {
        Some(t) if !t.is_empty() => t,
        _ => sargs_response(&state, &headline.tokens, None).query,
    };
    if term.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("headline `{id}` yields no search terms"),
        ));
    }

    let report = collect_reactions(
        source.as_ref(),
        &state.reactions,
        &headline,
        &term,
        state.collect,
    )
    .await;
    Ok(Json(CollectResp {
        search_term: term,
        report,
    }))
}

#[derive(Deserialize)]
struct SummaryReq {
    headline: Headline,
    search_term: String,
    #[serde(default)]
    reactions: Vec<Reaction>,
}

async fn summary_from_body(
    State(state): State<AppState>,
    Json(body): Json<SummaryReq>,
) -> Result<Json<ReactionReport>, ApiError> {
    body.headline
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let summary = summarize_reactions_with(
        &body.headline,
        &body.reactions,
        &body.search_term,
        state.polarity.as_ref(),
    );
    Ok(Json(summary.to_report()))
}

#[derive(Serialize)]
struct RefreshResp {
    size: usize,
}

async fn admin_refresh_corpus(
    State(state): State<AppState>,
) -> Result<Json<RefreshResp>, ApiError> {
    let size = state
        .corpus
        .refresh()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("refresh failed: {e}")))?;
    info!(target: "api", size, "corpus refreshed on request");
    Ok(Json(RefreshResp { size }))
}

fn find_headline(state: &AppState, id: &str) -> Result<Headline, ApiError> {
    state
        .headlines
        .get(id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown headline `{id}`")))
}
