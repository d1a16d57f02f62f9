// Narrative metadata — per-cluster summaries built from assigned posts.
//
// Narrative assignment itself happens upstream; this module only aggregates
// what the posts already carry so the risk engine and explanations have a
// size, an author count and a time span to work with.

use std::collections::{HashMap, HashSet};

use crate::models::{Narrative, Post};

/// How many domains / hashtags a summary keeps.
pub const TOP_TERMS: usize = 5;

/// Summarize every scored narrative, largest first.
///
/// Noise and unassigned posts are skipped. Equal sizes keep first-appearance
/// order.
pub fn summarize(posts: &[Post]) -> Vec<Narrative> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_narrative: HashMap<&str, Vec<&Post>> = HashMap::new();

    for post in posts {
        let Some(id) = post.scored_narrative() else {
            continue;
        };
        by_narrative
            .entry(id)
            .or_insert_with(|| {
                order.push(id);
                Vec::new()
            })
            .push(post);
    }

    let mut narratives: Vec<Narrative> = order
        .into_iter()
        .map(|id| summarize_one(id, &by_narrative[id]))
        .collect();

    narratives.sort_by(|a, b| b.size.cmp(&a.size));
    narratives
}

fn summarize_one(id: &str, posts: &[&Post]) -> Narrative {
    let authors: HashSet<&str> = posts.iter().map(|p| p.author_id.as_str()).collect();

    Narrative {
        id: id.to_string(),
        size: posts.len(),
        author_count: authors.len(),
        top_domains: top_terms(posts.iter().flat_map(|p| p.domains.iter())),
        top_hashtags: top_terms(posts.iter().flat_map(|p| p.hashtags.iter())),
        start_time: posts.iter().map(|p| p.timestamp).min(),
        end_time: posts.iter().map(|p| p.timestamp).max(),
    }
}

/// Most frequent terms; ties broken alphabetically.
fn top_terms<'a>(terms: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for term in terms {
        *counts.entry(term.as_str()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(TOP_TERMS)
        .map(|(term, _)| term.to_string())
        .collect()
}
