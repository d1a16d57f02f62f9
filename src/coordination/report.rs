// Coordination evidence reporting — summaries and human-readable blocks.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{CoordinatedGroup, CoordinatedPair};

/// Roll-up of one detection run, suitable for JSON export or display.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceSummary {
    pub total_pairs: usize,
    pub total_groups: usize,
    pub top_groups: Vec<GroupDigest>,
    pub most_coordinated_authors: Vec<AuthorDigest>,
    pub shared_domains: Vec<(String, usize)>,
    pub shared_hashtags: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupDigest {
    pub id: String,
    pub size: usize,
    pub score: f64,
    /// First five members
    pub author_ids: Vec<String>,
    pub narrative_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorDigest {
    pub author_id: String,
    pub avg_score: f64,
    pub pair_count: usize,
}

/// Summarize pairs and groups: the five strongest groups, the ten authors
/// in the most pairs, and the ten most shared domains and hashtags.
pub fn summarize(pairs: &[CoordinatedPair], groups: &[CoordinatedGroup]) -> EvidenceSummary {
    let mut sorted_groups: Vec<&CoordinatedGroup> = groups.iter().collect();
    sorted_groups.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let top_groups = sorted_groups
        .iter()
        .take(5)
        .map(|g| GroupDigest {
            id: g.id.clone(),
            size: g.size,
            score: round3(g.score),
            author_ids: g.author_ids.iter().take(5).cloned().collect(),
            narrative_ids: g.narrative_ids.clone(),
        })
        .collect();

    let mut author_scores: HashMap<&str, Vec<f64>> = HashMap::new();
    let mut domain_counts: HashMap<&str, usize> = HashMap::new();
    let mut hashtag_counts: HashMap<&str, usize> = HashMap::new();

    for pair in pairs {
        author_scores
            .entry(pair.author1_id.as_str())
            .or_default()
            .push(pair.score);
        author_scores
            .entry(pair.author2_id.as_str())
            .or_default()
            .push(pair.score);
        for domain in &pair.evidence.shared_domains {
            *domain_counts.entry(domain.as_str()).or_default() += 1;
        }
        for hashtag in &pair.evidence.shared_hashtags {
            *hashtag_counts.entry(hashtag.as_str()).or_default() += 1;
        }
    }

    let mut authors: Vec<AuthorDigest> = author_scores
        .into_iter()
        .map(|(author, scores)| AuthorDigest {
            author_id: author.to_string(),
            avg_score: scores.iter().sum::<f64>() / scores.len() as f64,
            pair_count: scores.len(),
        })
        .collect();
    // Most pairs first, then highest mean, then ID for a stable order
    authors.sort_by(|a, b| {
        b.pair_count
            .cmp(&a.pair_count)
            .then(
                b.avg_score
                    .partial_cmp(&a.avg_score)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then_with(|| a.author_id.cmp(&b.author_id))
    });
    authors.truncate(10);
    for a in &mut authors {
        a.avg_score = round3(a.avg_score);
    }

    EvidenceSummary {
        total_pairs: pairs.len(),
        total_groups: groups.len(),
        top_groups,
        most_coordinated_authors: authors,
        shared_domains: top_counts(domain_counts, 10),
        shared_hashtags: top_counts(hashtag_counts, 10),
    }
}

fn top_counts(counts: HashMap<&str, usize>, n: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Format one pair's evidence as a multi-line block.
pub fn format_pair_evidence(pair: &CoordinatedPair) -> String {
    let mut lines = vec![
        format!(
            "Coordination between {} and {}",
            pair.author1_id, pair.author2_id
        ),
        format!("Score: {:.3}", pair.score),
        format!("Narrative: {}", pair.narrative_id),
    ];

    let evidence = &pair.evidence;

    if !evidence.shared_domains.is_empty() {
        let shown: Vec<&str> = evidence.shared_domains.iter().take(5).map(String::as_str).collect();
        lines.push(format!("Shared domains: {}", shown.join(", ")));
    }

    if !evidence.shared_hashtags.is_empty() {
        let shown: Vec<String> = evidence
            .shared_hashtags
            .iter()
            .take(5)
            .map(|h| format!("#{h}"))
            .collect();
        lines.push(format!("Shared hashtags: {}", shown.join(", ")));
    }

    if let Some(sim) = evidence.text_similarity {
        lines.push(format!("Text similarity: {sim:.3}"));
    }

    if let Some(delta) = evidence.time_delta_seconds {
        lines.push(format!("Time difference: {:.1} minutes", delta / 60.0));
    }

    if !evidence.post_ids.is_empty() {
        let shown: Vec<&str> = evidence.post_ids.iter().take(4).map(String::as_str).collect();
        lines.push(format!("Example posts: {}", shown.join(", ")));
    }

    lines.join("\n")
}

/// Format a group with its members and a few of its direct connections.
pub fn format_group_evidence(group: &CoordinatedGroup, pairs: &[CoordinatedPair]) -> String {
    let mut lines = vec![
        format!("Coordination Group: {}", group.id),
        format!("Size: {} authors", group.size),
        format!("Average Score: {:.3}", group.score),
        String::new(),
        "Authors:".to_string(),
    ];

    for author in group.author_ids.iter().take(10) {
        lines.push(format!("  - {author}"));
    }
    if group.author_ids.len() > 10 {
        lines.push(format!("  ... and {} more", group.author_ids.len() - 10));
    }

    if !group.narrative_ids.is_empty() {
        lines.push(String::new());
        lines.push(format!("Related narratives: {}", group.narrative_ids.join(", ")));
    }

    let members: std::collections::HashSet<&str> =
        group.author_ids.iter().map(String::as_str).collect();
    let connections: Vec<&CoordinatedPair> = pairs
        .iter()
        .filter(|p| members.contains(p.author1_id.as_str()) && members.contains(p.author2_id.as_str()))
        .take(3)
        .collect();

    if !connections.is_empty() {
        lines.push(String::new());
        lines.push("Sample connections:".to_string());
        for p in connections {
            lines.push(format!(
                "  {} <-> {} (score: {:.3})",
                p.author1_id, p.author2_id, p.score
            ));
        }
    }

    lines.join("\n")
}
