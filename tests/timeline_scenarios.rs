// tests/timeline_scenarios.rs
//
// End-to-end reaction summaries: validity filters, granularity choice,
// bucket keys and per-bucket means.

use headline_pulse::headline::Headline;
use headline_pulse::reaction::{CreatedAt, Reaction};
use headline_pulse::timeline::{summarize_reactions, Granularity};
use rand::seq::SliceRandom;

const T0: i64 = 1_000_000_000;
const HOUR: i64 = 3_600;

fn headline() -> Headline {
    Headline::new("h1", "nyt", "Tension Rises in Region", T0)
}

#[test]
fn tension_rises_scenario() {
    let reactions = vec![
        Reaction::new(1, "Conflict escalates", T0 + 60)
            .with_polarity(0.5)
            .for_pair("h1", "tension region"),
        Reaction::new(2, "Tension Rises in Region http://x", T0 + 120)
            .with_polarity(0.0)
            .for_pair("h1", "tension region"),
        Reaction::new(3, "Unrelated", T0 - 10)
            .with_polarity(0.0)
            .for_pair("h1", "tension region"),
    ];

    let summary = summarize_reactions(&headline(), &reactions, "tension region");
    let ts = summary.series().expect("one valid reaction");
    assert_eq!(ts.granularity, Granularity::Minutes);
    assert_eq!(ts.valid_count, 1);
    assert_eq!(ts.points.len(), 1);
    assert_eq!(ts.points[0].bucket, 1);
    assert_eq!(ts.points[0].count, 1);
    assert!((ts.points[0].sentiment - 0.5).abs() < 1e-12);
}

#[test]
fn no_reactions_yield_no_data_sentinel() {
    let summary = summarize_reactions(&headline(), &[], "tension");
    assert!(summary.is_no_data());

    let v = serde_json::to_value(summary.to_report()).unwrap();
    assert!(v["points"].is_null());
    assert!(v["granularity"].is_null());
    assert!(v["valid_count"].is_null());
}

#[test]
fn granularity_follows_span_of_valid_reactions() {
    for (span, expected) in [
        (150 * HOUR, Granularity::Days),
        (5 * HOUR, Granularity::Hours),
        (2 * HOUR, Granularity::Minutes),
    ] {
        let reactions = vec![
            Reaction::new(1, "first take", T0 + 30).with_polarity(0.1),
            Reaction::new(2, "later take", T0 + 30 + span).with_polarity(0.1),
        ];
        let ts = summarize_reactions(&headline(), &reactions, "t")
            .series()
            .cloned()
            .unwrap();
        assert_eq!(ts.granularity, expected, "span {span}s");
        let last = ts.points.last().unwrap().bucket as i64;
        assert_eq!(last, (30 + span) / expected.seconds());
    }
}

#[test]
fn bucket_mean_independent_of_insertion_order() {
    let polarities: Vec<f64> = (0..40).map(|i| ((i * 37) % 21) as f64 / 10.0 - 1.0).collect();
    let batch_mean = polarities.iter().sum::<f64>() / polarities.len() as f64;

    let mut reactions: Vec<Reaction> = polarities
        .iter()
        .enumerate()
        .map(|(i, p)| Reaction::new(i as u64, format!("r{i}"), T0 + 5).with_polarity(*p))
        .collect();

    let mut rng = rand::rng();
    for _ in 0..5 {
        reactions.shuffle(&mut rng);
        let ts = summarize_reactions(&headline(), &reactions, "t")
            .series()
            .cloned()
            .unwrap();
        assert_eq!(ts.points.len(), 1);
        assert_eq!(ts.points[0].count, 40);
        assert!((ts.points[0].sentiment - batch_mean).abs() < 1e-9);
    }
}

#[test]
fn mixed_timestamp_formats_and_bad_rows() {
    let reactions = vec![
        Reaction::new(1, "rfc3339", CreatedAt::Text("2001-09-09T02:46:40Z".into())).with_polarity(0.2),
        Reaction::new(2, "social api", CreatedAt::Text("Sun Sep 09 02:50:00 +0000 2001".into()))
            .with_polarity(0.4),
        Reaction::new(3, "broken", CreatedAt::Text("sometime".into())).with_polarity(1.0),
        Reaction::new(4, "fractional", CreatedAt::EpochFrac((T0 + 90) as f64 + 0.5)).with_polarity(-0.6),
    ];
    let ts = summarize_reactions(&headline(), &reactions, "t")
        .series()
        .cloned()
        .unwrap();
    assert_eq!(ts.valid_count, 3);
    assert_eq!(ts.granularity, Granularity::Minutes);
    let keys: Vec<u64> = ts.points.iter().map(|p| p.bucket).collect();
    assert_eq!(keys, vec![1, 60, 63]);
}
