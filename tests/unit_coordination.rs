// Coordination detection tests — pair scoring, thresholds, grouping, determinism.
//
// Posts are built in memory; nothing here touches the database.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use narrative_graph::config::CoordinationConfig;
use narrative_graph::coordination::CoordinationDetector;
use narrative_graph::models::{Post, NOISE_NARRATIVE};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

fn post(id: &str, author: &str, narrative: &str, minutes: i64) -> Post {
    Post {
        id: id.to_string(),
        timestamp: base_time() + Duration::minutes(minutes),
        author_id: author.to_string(),
        text: format!("post {id}"),
        urls: vec![],
        domains: BTreeSet::new(),
        hashtags: BTreeSet::new(),
        embedding: None,
        narrative_id: Some(narrative.to_string()),
    }
}

fn with_tags(mut p: Post, domains: &[&str], hashtags: &[&str]) -> Post {
    p.domains = domains.iter().map(|s| s.to_string()).collect();
    p.hashtags = hashtags.iter().map(|s| s.to_string()).collect();
    p
}

/// Identical content: same domain, same hashtag, same embedding.
fn amplifier(id: &str, author: &str, narrative: &str, minutes: i64) -> Post {
    let mut p = with_tags(post(id, author, narrative, minutes), &["news.example"], &["vote"]);
    p.embedding = Some(vec![0.6, 0.8, 0.0]);
    p
}

// ============================================================
// Reference scenarios
// ============================================================

#[test]
fn shared_hashtag_alone_stays_below_default_threshold() {
    let mut posts = Vec::new();
    for i in 0..3 {
        posts.push(with_tags(post(&format!("a{i}"), "alice", "n1", i), &[], &["rally"]));
        posts.push(with_tags(post(&format!("b{i}"), "bob", "n1", i + 1), &[], &["rally"]));
    }

    let detector = CoordinationDetector::new(CoordinationConfig::default());
    let (pairs, groups) = detector.detect(&posts, None);
    assert!(pairs.is_empty());
    assert!(groups.is_empty());
}

#[test]
fn four_identical_amplifiers_form_one_group() {
    let posts: Vec<Post> = ["u1", "u2", "u3", "u4"]
        .iter()
        .enumerate()
        .map(|(i, author)| amplifier(&format!("p{i}"), author, "n1", i as i64 * 2))
        .collect();

    let detector = CoordinationDetector::new(CoordinationConfig::default());
    let (pairs, groups) = detector.detect(&posts, None);

    assert_eq!(pairs.len(), 6);
    assert!(pairs.iter().all(|p| p.score >= 0.85 && p.score <= 1.0));
    assert_eq!(groups.len(), 1);
    let g = &groups[0];
    assert_eq!(g.size, 4);
    assert_eq!(g.author_ids, vec!["u1", "u2", "u3", "u4"]);
    assert_eq!(g.narrative_ids, vec!["n1"]);
    assert!((g.score - 1.0).abs() < 1e-9);
}

#[test]
fn removing_the_bridge_author_eliminates_the_group() {
    // u1 and u3 are too far apart in time to be compared; u2 bridges them
    let posts = vec![
        amplifier("p1", "u1", "n1", 0),
        amplifier("p2", "u2", "n1", 50),
        amplifier("p3", "u3", "n1", 100),
    ];
    let detector = CoordinationDetector::new(CoordinationConfig::default());

    let (pairs, groups) = detector.detect(&posts, None);
    assert_eq!(pairs.len(), 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].author_ids, vec!["u1", "u2", "u3"]);

    let without_bridge: Vec<Post> = posts.into_iter().filter(|p| p.author_id != "u2").collect();
    let (pairs, groups) = detector.detect(&without_bridge, None);
    assert!(pairs.is_empty());
    assert!(groups.is_empty());
}

// ============================================================
// Threshold and window boundaries
// ============================================================

#[test]
fn score_exactly_at_threshold_is_kept() {
    // No embeddings: domain Jaccard 1.0 and hashtag Jaccard 1.0 give 0.3 + 0.2
    let posts = vec![
        with_tags(post("p1", "a", "n1", 0), &["x.com"], &["t"]),
        with_tags(post("p2", "b", "n1", 1), &["x.com"], &["t"]),
    ];

    let at = CoordinationConfig {
        similarity_threshold: 0.5,
        ..Default::default()
    };
    let (pairs, _) = CoordinationDetector::new(at).detect(&posts, None);
    assert_eq!(pairs.len(), 1);
    assert!((pairs[0].score - 0.5).abs() < 1e-12);

    let above = CoordinationConfig {
        similarity_threshold: 0.5 + 1e-9,
        ..Default::default()
    };
    let (pairs, _) = CoordinationDetector::new(above).detect(&posts, None);
    assert!(pairs.is_empty());
}

#[test]
fn time_window_is_inclusive() {
    let config = CoordinationConfig {
        similarity_threshold: 0.5,
        ..Default::default()
    };
    let at_edge = vec![
        with_tags(post("p1", "a", "n1", 0), &["x.com"], &["t"]),
        with_tags(post("p2", "b", "n1", 60), &["x.com"], &["t"]),
    ];
    let (pairs, _) = CoordinationDetector::new(config.clone()).detect(&at_edge, None);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].evidence.time_delta_seconds, Some(3600.0));

    let mut past_edge = at_edge;
    past_edge[1].timestamp = past_edge[1].timestamp + Duration::seconds(1);
    let (pairs, _) = CoordinationDetector::new(config).detect(&past_edge, None);
    assert!(pairs.is_empty());
}

// ============================================================
// Group minimum size
// ============================================================

#[test]
fn component_one_short_of_minimum_is_dropped() {
    let posts = vec![amplifier("p1", "u1", "n1", 0), amplifier("p2", "u2", "n1", 1)];
    let detector = CoordinationDetector::new(CoordinationConfig::default());
    let (pairs, groups) = detector.detect(&posts, None);
    assert_eq!(pairs.len(), 1);
    assert!(groups.is_empty());

    let two = CoordinationConfig {
        min_group_size: 2,
        ..Default::default()
    };
    let (_, groups) = CoordinationDetector::new(two).detect(&posts, None);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 2);
}

// ============================================================
// Narrative partitioning
// ============================================================

#[test]
fn noise_posts_and_single_post_narratives_are_ignored() {
    let posts = vec![
        amplifier("p1", "u1", NOISE_NARRATIVE, 0),
        amplifier("p2", "u2", NOISE_NARRATIVE, 1),
        amplifier("p3", "u3", "lonely", 2),
    ];
    let (pairs, groups) = CoordinationDetector::new(CoordinationConfig::default()).detect(&posts, None);
    assert!(pairs.is_empty());
    assert!(groups.is_empty());
}

#[test]
fn same_authors_in_two_narratives_yield_two_pairs() {
    let posts = vec![
        amplifier("p1", "u1", "n1", 0),
        amplifier("p2", "u2", "n1", 1),
        amplifier("p3", "u1", "n2", 2),
        amplifier("p4", "u2", "n2", 3),
    ];
    let two = CoordinationConfig {
        min_group_size: 2,
        ..Default::default()
    };
    let (pairs, groups) = CoordinationDetector::new(two).detect(&posts, None);
    let narratives: Vec<&str> = pairs.iter().map(|p| p.narrative_id.as_str()).collect();
    assert_eq!(narratives, vec!["n1", "n2"]);
    assert_eq!(groups.len(), 1);
    // the pair map keeps one record per author pair, so only the last
    // narrative contributes
    assert_eq!(groups[0].narrative_ids, vec!["n2"]);
}

#[test]
fn embedding_matrix_overrides_post_vectors() {
    let posts = vec![
        with_tags(post("p1", "a", "n1", 0), &["x.com"], &["t"]),
        with_tags(post("p2", "b", "n1", 1), &["x.com"], &["t"]),
    ];
    let matrix = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
    let (pairs, _) = CoordinationDetector::new(CoordinationConfig::default()).detect(&posts, Some(&matrix));
    assert_eq!(pairs.len(), 1);
    assert!((pairs[0].score - 1.0).abs() < 1e-9);
    assert_eq!(pairs[0].evidence.text_similarity.map(|s| (s * 1e6).round()), Some(1e6));
    assert_eq!(pairs[0].evidence.shared_domains, vec!["x.com"]);
    assert_eq!(pairs[0].evidence.post_ids, vec!["p1", "p2"]);
}

// ============================================================
// Determinism
// ============================================================

#[test]
fn repeated_detection_is_identical() {
    let mut posts = Vec::new();
    for (n, narrative) in ["n1", "n2", "n3"].iter().enumerate() {
        for (i, author) in ["zed", "amy", "kim", "bo", "lu"].iter().enumerate() {
            let mut p = amplifier(&format!("{narrative}-{author}"), author, narrative, (i + n) as i64);
            if i == 4 {
                p.embedding = Some(vec![0.0, 0.0, 1.0]);
            }
            posts.push(p);
        }
    }

    let detector = CoordinationDetector::new(CoordinationConfig::default());
    let first = detector.detect(&posts, None);
    for _ in 0..5 {
        assert_eq!(detector.detect(&posts, None), first);
    }

    // pairs come out narrative by narrative, authors in sorted order
    let (pairs, groups) = first;
    assert_eq!(pairs[0].narrative_id, "n1");
    assert_eq!((pairs[0].author1_id.as_str(), pairs[0].author2_id.as_str()), ("amy", "bo"));
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, "coord_group_0000");
}

#[test]
fn empty_input_detects_nothing() {
    let detector = CoordinationDetector::new(CoordinationConfig::default());
    let (pairs, groups) = detector.detect(&[], None);
    assert!(pairs.is_empty());
    assert!(groups.is_empty());
}
