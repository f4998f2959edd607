//! # Reaction Timeline
//! Turns the reactions collected for one (headline, search term) pair into a
//! sentiment time series relative to the headline's publish moment.
//!
//! Pipeline: validity filter → granularity from the span of valid reactions →
//! bucket key `floor((t - publish) / granularity)` → running mean per bucket.
//! Bucket keys are never negative because pre-publish reactions are dropped
//! before bucketing.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::headline::Headline;
use crate::reaction::{check_reaction, Reaction, Rejection};
use crate::sentiment::{LexiconPolarity, PolarityScorer};
use crate::telemetry::anon_hash;

const MINUTE: i64 = 60;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Minutes,
    Hours,
    Days,
}

impl Granularity {
    /// Pick the bucket size from the spread between earliest and latest reaction.
    ///
    /// More than 144 h → days, more than 4 h → hours, otherwise minutes.
    pub fn for_span(span_secs: i64) -> Self {
        let span_hours = span_secs as f64 / HOUR as f64;
        if span_hours > 144.0 {
            Granularity::Days
        } else if span_hours > 4.0 {
            Granularity::Hours
        } else {
            Granularity::Minutes
        }
    }

    pub fn seconds(self) -> i64 {
        match self {
            Granularity::Minutes => MINUTE,
            Granularity::Hours => HOUR,
            Granularity::Days => DAY,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Granularity::Minutes => "minutes",
            Granularity::Hours => "hours",
            Granularity::Days => "days",
        }
    }
}

/// Bucket index of a reaction; `reaction_time` must not precede `publish_time`.
pub fn bucket_key(reaction_time: i64, publish_time: i64, granularity: Granularity) -> u64 {
    let offset = (reaction_time - publish_time).max(0);
    (offset / granularity.seconds()) as u64
}

/// Running count and mean of one bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    pub count: u64,
    pub mean: f64,
    pub texts: Vec<String>,
}

impl Bucket {
    pub fn add(&mut self, polarity: f64, text: &str) {
        let n = self.count as f64;
        self.mean = (self.mean * n + polarity) / (n + 1.0);
        self.count += 1;
        self.texts.push(text.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub bucket: u64,
    pub label: Granularity,
    pub sentiment: f64,
    pub count: u64,
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub search_term: String,
    pub granularity: Granularity,
    pub valid_count: usize,
    /// Ascending by bucket.
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Series(TimeSeries),
    NoData { search_term: String },
}

impl Summary {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Summary::NoData { .. })
    }

    pub fn series(&self) -> Option<&TimeSeries> {
        match self {
            Summary::Series(ts) => Some(ts),
            Summary::NoData { .. } => None,
        }
    }

    /// Wire shape: "no data" keeps the object but nulls the three data fields.
    pub fn to_report(&self) -> ReactionReport {
        match self {
            Summary::Series(ts) => ReactionReport {
                search_term: ts.search_term.clone(),
                granularity: Some(ts.granularity),
                valid_count: Some(ts.valid_count),
                points: Some(ts.points.clone()),
            },
            Summary::NoData { search_term } => ReactionReport {
                search_term: search_term.clone(),
                granularity: None,
                valid_count: None,
                points: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionReport {
    pub search_term: String,
    pub granularity: Option<Granularity>,
    pub valid_count: Option<usize>,
    pub points: Option<Vec<SeriesPoint>>,
}

/// Per-reason counts of reactions that did not make it into the series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dropped {
    pub malformed: usize,
    pub duplicate: usize,
    pub pre_publish: usize,
}

struct Valid<'a> {
    time: i64,
    polarity: f64,
    text: &'a str,
}

/// Summarize with the built-in lexicon scorer for reactions lacking polarity.
pub fn summarize_reactions(headline: &Headline, reactions: &[Reaction], search_term: &str) -> Summary {
    summarize_reactions_with(headline, reactions, search_term, &LexiconPolarity::new())
}

pub fn summarize_reactions_with(
    headline: &Headline,
    reactions: &[Reaction],
    search_term: &str,
    scorer: &dyn PolarityScorer,
) -> Summary {
    counter!("reactions_received_total").increment(reactions.len() as u64);

    let (valid, dropped) = filter_valid(headline, reactions, scorer);
    counter!("reactions_malformed_total").increment(dropped.malformed as u64);
    counter!("reactions_duplicate_total").increment(dropped.duplicate as u64);
    counter!("reactions_prepublish_total").increment(dropped.pre_publish as u64);

    let (Some(min), Some(max)) = (
        valid.iter().map(|v| v.time).min(),
        valid.iter().map(|v| v.time).max(),
    ) else {
        counter!("summaries_no_data_total").increment(1);
        debug!(
            target: "timeline",
            headline = %anon_hash(&headline.text),
            received = reactions.len(),
            ?dropped,
            "no valid reactions"
        );
        return Summary::NoData {
            search_term: search_term.to_string(),
        };
    };

    let granularity = Granularity::for_span(max - min);
    let mut buckets: BTreeMap<u64, Bucket> = BTreeMap::new();
    for v in &valid {
        let key = bucket_key(v.time, headline.publish_time, granularity);
        buckets.entry(key).or_default().add(v.polarity, v.text);
    }

    let points: Vec<SeriesPoint> = buckets
        .into_iter()
        .map(|(bucket, b)| SeriesPoint {
            bucket,
            label: granularity,
            sentiment: b.mean,
            count: b.count,
            texts: b.texts,
        })
        .collect();

    debug!(
        target: "timeline",
        headline = %anon_hash(&headline.text),
        granularity = granularity.label(),
        valid = valid.len(),
        buckets = points.len(),
        ?dropped,
        "timeline built"
    );

    Summary::Series(TimeSeries {
        search_term: search_term.to_string(),
        granularity,
        valid_count: valid.len(),
        points,
    })
}

fn filter_valid<'a>(
    headline: &Headline,
    reactions: &'a [Reaction],
    scorer: &dyn PolarityScorer,
) -> (Vec<Valid<'a>>, Dropped) {
    let mut dropped = Dropped::default();
    let mut valid = Vec::with_capacity(reactions.len());

    for r in reactions {
        let time = match check_reaction(r, headline) {
            Ok(t) => t,
            Err(Rejection::Malformed) => {
                warn!(target: "timeline", reaction = r.id, "skipping reaction with unparsable timestamp");
                dropped.malformed += 1;
                continue;
            }
            Err(Rejection::Duplicate) => {
                dropped.duplicate += 1;
                continue;
            }
            Err(Rejection::PrePublish) => {
                dropped.pre_publish += 1;
                continue;
            }
        };

        let polarity = r.polarity.unwrap_or_else(|| scorer.polarity(&r.text));
        if !polarity.is_finite() {
            warn!(target: "timeline", reaction = r.id, "skipping reaction with non-finite polarity");
            dropped.malformed += 1;
            continue;
        }

        valid.push(Valid {
            time,
            polarity: polarity.clamp(-1.0, 1.0),
            text: r.text.as_str(),
        });
    }

    (valid, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::CreatedAt;

    const T0: i64 = 1_000_000_000;

    fn headline() -> Headline {
        Headline::new("h1", "nyt", "Tension Rises in Region", T0)
    }

    struct Fixed(f64);
    impl PolarityScorer for Fixed {
        fn polarity(&self, _text: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn granularity_boundaries() {
        assert_eq!(Granularity::for_span(150 * HOUR), Granularity::Days);
        assert_eq!(Granularity::for_span(144 * HOUR), Granularity::Hours);
        assert_eq!(Granularity::for_span(144 * HOUR + 1), Granularity::Days);
        assert_eq!(Granularity::for_span(5 * HOUR), Granularity::Hours);
        assert_eq!(Granularity::for_span(4 * HOUR), Granularity::Minutes);
        assert_eq!(Granularity::for_span(4 * HOUR + 1), Granularity::Hours);
        assert_eq!(Granularity::for_span(2 * HOUR), Granularity::Minutes);
        assert_eq!(Granularity::for_span(0), Granularity::Minutes);
    }

    #[test]
    fn bucket_key_floors() {
        assert_eq!(bucket_key(T0, T0, Granularity::Minutes), 0);
        assert_eq!(bucket_key(T0 + 59, T0, Granularity::Minutes), 0);
        assert_eq!(bucket_key(T0 + 60, T0, Granularity::Minutes), 1);
        assert_eq!(bucket_key(T0 + 7_199, T0, Granularity::Hours), 1);
        assert_eq!(bucket_key(T0 + 3 * DAY, T0, Granularity::Days), 3);
    }

    #[test]
    fn running_mean_equals_batch_mean() {
        let ps = [0.5, -0.25, 1.0, 0.0, -1.0, 0.3];
        let mut b = Bucket::default();
        for p in ps {
            b.add(p, "x");
        }
        let batch = ps.iter().sum::<f64>() / ps.len() as f64;
        assert!((b.mean - batch).abs() < 1e-12);
        assert_eq!(b.count, 6);
    }

    #[test]
    fn scenario_single_valid_reaction() {
        let reactions = vec![
            Reaction::new(1, "Conflict escalates", T0 + 60).with_polarity(0.5),
            Reaction::new(2, "Tension Rises in Region http://x", T0 + 120).with_polarity(0.9),
            Reaction::new(3, "Unrelated", T0 - 10).with_polarity(-0.9),
        ];
        let s = summarize_reactions(&headline(), &reactions, "tension region");
        let ts = s.series().expect("series");
        assert_eq!(ts.granularity, Granularity::Minutes);
        assert_eq!(ts.valid_count, 1);
        assert_eq!(ts.points.len(), 1);
        assert_eq!(ts.points[0].bucket, 1);
        assert_eq!(ts.points[0].count, 1);
        assert!((ts.points[0].sentiment - 0.5).abs() < 1e-12);
        assert_eq!(ts.points[0].texts, vec!["Conflict escalates".to_string()]);
    }

    #[test]
    fn no_reactions_is_no_data() {
        let s = summarize_reactions(&headline(), &[], "tension");
        assert!(s.is_no_data());
        let r = s.to_report();
        assert_eq!(r.search_term, "tension");
        assert!(r.granularity.is_none() && r.valid_count.is_none() && r.points.is_none());
    }

    #[test]
    fn all_filtered_is_no_data() {
        let reactions = vec![
            Reaction::new(1, "Tension rises in region", T0 + 5),
            Reaction::new(2, "early", T0 - 1),
            Reaction::new(3, "broken", CreatedAt::Text("??".into())),
        ];
        assert!(summarize_reactions(&headline(), &reactions, "t").is_no_data());
    }

    #[test]
    fn malformed_timestamp_skips_only_that_reaction() {
        let reactions = vec![
            Reaction::new(1, "a", CreatedAt::Text("garbage".into())).with_polarity(1.0),
            Reaction::new(2, "b", T0 + 30).with_polarity(-0.5),
        ];
        let ts = summarize_reactions(&headline(), &reactions, "t")
            .series()
            .cloned()
            .expect("series");
        assert_eq!(ts.valid_count, 1);
        assert_eq!(ts.points[0].bucket, 0);
        assert_eq!(ts.points[0].sentiment, -0.5);
    }

    #[test]
    fn span_uses_valid_reactions_only() {
        // the pre-publish reaction would widen the span to > 4h if counted
        let reactions = vec![
            Reaction::new(1, "early", T0 - 10 * HOUR).with_polarity(0.1),
            Reaction::new(2, "a", T0 + 10).with_polarity(0.1),
            Reaction::new(3, "b", T0 + 3 * HOUR).with_polarity(0.3),
        ];
        let ts = summarize_reactions(&headline(), &reactions, "t")
            .series()
            .cloned()
            .unwrap();
        assert_eq!(ts.granularity, Granularity::Minutes);
        let keys: Vec<u64> = ts.points.iter().map(|p| p.bucket).collect();
        assert_eq!(keys, vec![0, 180]);
    }

    #[test]
    fn points_ascending_and_means_per_bucket() {
        let reactions = vec![
            Reaction::new(1, "late", T0 + 8 * DAY).with_polarity(-1.0),
            Reaction::new(2, "first", T0 + 100).with_polarity(0.2),
            Reaction::new(3, "second", T0 + 200).with_polarity(0.6),
            Reaction::new(4, "mid", T0 + 2 * DAY + 5).with_polarity(0.0),
        ];
        let ts = summarize_reactions(&headline(), &reactions, "t")
            .series()
            .cloned()
            .unwrap();
        assert_eq!(ts.granularity, Granularity::Days);
        let keys: Vec<u64> = ts.points.iter().map(|p| p.bucket).collect();
        assert_eq!(keys, vec![0, 2, 8]);
        assert_eq!(ts.points[0].count, 2);
        assert!((ts.points[0].sentiment - 0.4).abs() < 1e-12);
        assert!(ts.points.iter().all(|p| p.label == Granularity::Days));
    }

    #[test]
    fn missing_polarity_uses_scorer_and_clamps() {
        let reactions = vec![
            Reaction::new(1, "a", T0 + 1),
            Reaction::new(2, "b", T0 + 2).with_polarity(3.0),
        ];
        let ts = summarize_reactions_with(&headline(), &reactions, "t", &Fixed(-0.5))
            .series()
            .cloned()
            .unwrap();
        assert_eq!(ts.points[0].count, 2);
        // (-0.5 + 1.0) / 2
        assert!((ts.points[0].sentiment - 0.25).abs() < 1e-12);
    }

    #[test]
    fn non_finite_polarity_is_skipped() {
        let reactions = vec![
            Reaction::new(1, "a", T0 + 1).with_polarity(f64::NAN),
            Reaction::new(2, "b", T0 + 2).with_polarity(0.1),
        ];
        let ts = summarize_reactions(&headline(), &reactions, "t")
            .series()
            .cloned()
            .unwrap();
        assert_eq!(ts.valid_count, 1);
    }

    #[test]
    fn report_serializes_lowercase_labels() {
        let reactions = vec![Reaction::new(1, "a", T0 + 61).with_polarity(0.5)];
        let r = summarize_reactions(&headline(), &reactions, "t").to_report();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["granularity"], "minutes");
        assert_eq!(v["valid_count"], 1);
        assert_eq!(v["points"][0]["label"], "minutes");
        assert_eq!(v["points"][0]["bucket"], 1);

        let none = Summary::NoData {
            search_term: "t".into(),
        }
        .to_report();
        let v = serde_json::to_value(&none).unwrap();
        assert!(v["points"].is_null() && v["granularity"].is_null() && v["valid_count"].is_null());
    }
}
