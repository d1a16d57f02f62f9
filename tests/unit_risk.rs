// Risk scoring tests — component heuristics and the weighted engine.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use narrative_graph::config::{RiskConfig, RiskWeights};
use narrative_graph::models::{CoordinatedGroup, Narrative, Post, RiskComponents, RiskLevel};
use narrative_graph::narratives;
use narrative_graph::risk::components::{
    bot_score, coordination_density_score, foreign_domain_score, velocity_score,
};
use narrative_graph::risk::engine::{generate_reasons, NO_RISK_REASON};
use narrative_graph::risk::toxicity::{KeywordToxicityScorer, ToxicityScorer};
use narrative_graph::risk::RiskEngine;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

fn post(id: &str, author: &str, narrative: &str, secs: i64, text: &str) -> Post {
    Post {
        id: id.to_string(),
        timestamp: base_time() + Duration::seconds(secs),
        author_id: author.to_string(),
        text: text.to_string(),
        urls: vec![],
        domains: BTreeSet::new(),
        hashtags: BTreeSet::new(),
        embedding: None,
        narrative_id: Some(narrative.to_string()),
    }
}

fn refs(posts: &[Post]) -> Vec<&Post> {
    posts.iter().collect()
}

fn narrative(id: &str, author_count: usize) -> Narrative {
    Narrative {
        id: id.to_string(),
        size: 0,
        author_count,
        top_domains: vec![],
        top_hashtags: vec![],
        start_time: None,
        end_time: None,
    }
}

fn group(id: &str, authors: &[&str], score: f64, narratives: &[&str]) -> CoordinatedGroup {
    CoordinatedGroup {
        id: id.to_string(),
        author_ids: authors.iter().map(|s| s.to_string()).collect(),
        score,
        evidence_summary: String::new(),
        narrative_ids: narratives.iter().map(|s| s.to_string()).collect(),
        size: authors.len(),
    }
}

fn assert_unit_interval(c: &RiskComponents) {
    for value in [
        c.velocity,
        c.coordination_density,
        c.bot_score,
        c.foreign_domain_ratio,
        c.toxicity,
    ] {
        assert!((0.0..=1.0).contains(&value), "component out of range: {value}");
    }
}

// ============================================================
// Empty input
// ============================================================

#[test]
fn every_component_is_zero_for_no_posts() {
    assert_eq!(velocity_score(&[]), 0.0);
    assert_eq!(bot_score(&[]), 0.0);
    assert_eq!(foreign_domain_score(&[], &[".ru".to_string()]), 0.0);
    assert_eq!(KeywordToxicityScorer.score(&[]), 0.0);
    assert_eq!(coordination_density_score("n1", &[], 0), 0.0);
}

// ============================================================
// Velocity
// ============================================================

#[test]
fn hundred_posts_in_an_hour_saturates_velocity() {
    let posts: Vec<Post> = (0..100)
        .map(|i| post(&format!("p{i}"), &format!("u{i}"), "n1", i * 36, "update"))
        .collect();
    assert!((velocity_score(&refs(&posts)) - 1.0).abs() < 1e-9);
}

#[test]
fn simultaneous_posts_score_maximum_velocity() {
    let posts = vec![post("p1", "a", "n1", 0, "x"), post("p2", "b", "n1", 0, "y")];
    assert_eq!(velocity_score(&refs(&posts)), 1.0);
}

#[test]
fn slow_narrative_scores_base_rate_only() {
    // 3 posts over 2 hours = 1.5 posts/hour -> 0.15, no bursts
    let posts = vec![
        post("p1", "a", "n1", 0, "x"),
        post("p2", "b", "n1", 3600, "y"),
        post("p3", "c", "n1", 7200, "z"),
    ];
    assert!((velocity_score(&refs(&posts)) - 0.15).abs() < 1e-9);
}

// ============================================================
// Foreign domains
// ============================================================

#[test]
fn one_foreign_domain_of_two_scores_half() {
    let mut p = post("p1", "a", "n1", 0, "x");
    p.domains = ["a.com", "b.ru"].iter().map(|s| s.to_string()).collect();
    let score = foreign_domain_score(&[&p], &[".ru".to_string()]);
    assert_eq!(score, 0.5);
}

#[test]
fn repeated_domains_count_once() {
    let mut p1 = post("p1", "a", "n1", 0, "x");
    p1.domains = ["b.ru".to_string()].into_iter().collect();
    let mut p2 = post("p2", "b", "n1", 10, "y");
    p2.domains = ["b.ru".to_string(), "c.org".to_string()].into_iter().collect();
    assert_eq!(foreign_domain_score(&[&p1, &p2], &[".ru".to_string()]), 0.5);
}

// ============================================================
// Bot-likeness
// ============================================================

#[test]
fn clockwork_duplicate_spammer_scores_high() {
    // 6 identical posts with links, exactly 60s apart: fast, duplicated,
    // regular, link-heavy
    let posts: Vec<Post> = (0..6)
        .map(|i| {
            let mut p = post(&format!("p{i}"), "bot", "n1", i * 60, "same text");
            p.urls = vec!["https://b.ru/x".to_string()];
            p
        })
        .collect();
    assert!((bot_score(&refs(&posts)) - 1.0).abs() < 1e-9);
}

#[test]
fn single_post_authors_are_not_judged() {
    let posts = vec![post("p1", "a", "n1", 0, "x"), post("p2", "b", "n1", 5, "x")];
    assert_eq!(bot_score(&refs(&posts)), 0.0);
}

// ============================================================
// Coordination density
// ============================================================

#[test]
fn density_mixes_ratio_and_group_score() {
    let groups = vec![group("g0", &["a", "b", "c"], 0.9, &["n1"])];
    // ratio 3/6 = 0.5, avg group score 0.9*3/3 = 0.9 -> 0.3 + 0.36
    let score = coordination_density_score("n1", &groups, 6);
    assert!((score - 0.66).abs() < 1e-9);
}

#[test]
fn groups_elsewhere_do_not_count() {
    let groups = vec![group("g0", &["a", "b", "c"], 0.9, &["n2"])];
    assert_eq!(coordination_density_score("n1", &groups, 6), 0.0);
    assert_eq!(coordination_density_score("n2", &groups, 1), 0.0);
}

// ============================================================
// Toxicity
// ============================================================

#[test]
fn five_percent_toxic_tokens_saturate() {
    let mut words = vec!["fine"; 19];
    words.push("Traitor!");
    let p = post("p1", "a", "n1", 0, &words.join(" "));
    assert!((KeywordToxicityScorer.score(&[&p]) - 1.0).abs() < 1e-9);

    let calm = post("p2", "a", "n1", 0, "lovely weather for a picnic");
    assert_eq!(KeywordToxicityScorer.score(&[&calm]), 0.0);
}

// ============================================================
// Engine
// ============================================================

#[test]
fn quiet_narrative_is_low_with_single_reason() {
    let posts = vec![post("p1", "a", "n1", 0, "hello world")];
    let engine = RiskEngine::new(RiskConfig::default());
    let risk = engine.calculate_risk(&narrative("n1", 1), &refs(&posts), &[]);

    assert_eq!(risk.risk_score, 0.0);
    assert_eq!(risk.risk_level, RiskLevel::Low);
    assert_eq!(risk.reasons, vec![NO_RISK_REASON.to_string()]);
    assert_eq!(risk.components, RiskComponents::default());
}

#[test]
fn risk_score_is_weighted_sum_rounded() {
    let mut posts = vec![
        post("p1", "a", "n1", 0, "the enemy spreads lies"),
        post("p2", "b", "n1", 0, "calm"),
    ];
    posts[0].domains = ["x.ru".to_string()].into_iter().collect();
    let engine = RiskEngine::new(RiskConfig::default());
    let risk = engine.calculate_risk(&narrative("n1", 2), &refs(&posts), &[]);

    // velocity 1.0 (same timestamp), foreign 1.0, toxicity 1.0
    assert_eq!(risk.components.velocity, 1.0);
    assert_eq!(risk.components.foreign_domain_ratio, 1.0);
    assert_eq!(risk.components.toxicity, 1.0);
    assert!((risk.risk_score - 0.5).abs() < 1e-9);
    assert_eq!(risk.risk_level, RiskLevel::Low);
    assert_eq!(risk.reasons.len(), 3);
    assert_eq!(
        risk.reasons[0],
        "High posting velocity (1.00) - contributes 0.25 to risk"
    );
}

#[test]
fn weights_above_one_are_not_clamped() {
    let config = RiskConfig {
        weights: RiskWeights {
            velocity: 2.0,
            ..RiskWeights::default()
        },
        ..RiskConfig::default()
    };
    let posts = vec![post("p1", "a", "n1", 0, "x"), post("p2", "b", "n1", 0, "y")];
    let risk = RiskEngine::new(config).calculate_risk(&narrative("n1", 2), &refs(&posts), &[]);
    assert!((risk.risk_score - 2.0).abs() < 1e-9);
    assert_eq!(risk.risk_level, RiskLevel::High);
}

#[test]
fn reasons_use_inclusive_threshold() {
    let c = RiskComponents {
        bot_score: 0.3,
        ..Default::default()
    };
    let reasons = generate_reasons(&c, &RiskWeights::default());
    assert_eq!(
        reasons,
        vec!["Bot-like activity patterns (0.30) - contributes 0.06 to risk".to_string()]
    );
}

#[test]
fn calculate_all_skips_empty_narratives_and_ranks() {
    let mut posts = vec![
        post("p1", "a", "calm", 0, "nice day"),
        post("p2", "b", "calm", 7200, "indeed"),
        post("p3", "c", "hot", 0, "war war war"),
        post("p4", "d", "hot", 0, "invasion"),
    ];
    posts[2].domains = ["x.ru".to_string()].into_iter().collect();

    let mut narratives = narratives::summarize(&posts);
    narratives.push(narrative("ghost", 0));

    let engine = RiskEngine::new(RiskConfig::default());
    let risks = engine.calculate_all(&posts, &narratives, &[]);

    let ids: Vec<&str> = risks.iter().map(|r| r.narrative_id.as_str()).collect();
    assert_eq!(ids, vec!["hot", "calm"]);
    assert!(risks[0].risk_score >= risks[1].risk_score);
    for risk in &risks {
        assert_unit_interval(&risk.components);
    }
}

#[test]
fn components_stay_in_unit_interval_across_shapes() {
    let engine = RiskEngine::new(RiskConfig::default());
    for n in 1..30i64 {
        let posts: Vec<Post> = (0..n)
            .map(|i| {
                let mut p = post(
                    &format!("p{i}"),
                    &format!("u{}", i % 4),
                    "n1",
                    i * (n % 7) * 13,
                    if i % 3 == 0 { "hate hate lies" } else { "ordinary words here" },
                );
                if i % 2 == 0 {
                    p.urls = vec!["https://site.cn/a".to_string()];
                    p.domains = ["site.cn".to_string()].into_iter().collect();
                }
                p
            })
            .collect();
        let groups = vec![group("g0", &["u0", "u1", "u2"], 0.97, &["n1"])];
        let authors = (n as usize).min(4);
        let risk = engine.calculate_risk(&narrative("n1", authors), &refs(&posts), &groups);
        assert_unit_interval(&risk.components);
        assert!(risk.risk_score >= 0.0 && risk.risk_score <= 1.0);
    }
}
