// Evidence calculator — how strongly two authors' posts line up.
//
// Only post pairs within the time window are compared. Each compared pair
// gets a blended score (embedding similarity, domain Jaccard, hashtag
// Jaccard), and the author pair takes the MAXIMUM: one strong link is
// enough to flag two accounts.

use std::collections::{BTreeSet, HashSet};

use crate::config::CoordinationConfig;
use crate::embeddings::cosine_similarity;
use crate::models::{CoordinationEvidence, Post};

/// A post together with its row in the caller's embedding matrix.
pub type IndexedPost<'a> = (&'a Post, usize);

/// Score two authors' posts against each other.
///
/// `embeddings`, when given, is indexed by the position each post had in the
/// original post list. Without it, posts' own `embedding` fields are used
/// when both sides have one; otherwise text similarity is 0.0.
///
/// Returns 0.0 and empty evidence if no post pair falls within the window.
pub fn score_pair(
    posts_a: &[IndexedPost<'_>],
    posts_b: &[IndexedPost<'_>],
    embeddings: Option<&[Vec<f64>]>,
    config: &CoordinationConfig,
) -> (f64, CoordinationEvidence) {
    let window = config.time_window_secs();

    let mut evidence = CoordinationEvidence::default();
    let mut best: Option<f64> = None;

    for &(post_a, idx_a) in posts_a {
        for &(post_b, idx_b) in posts_b {
            let delta = (post_a.timestamp - post_b.timestamp).num_seconds().abs() as f64;
            if delta > window {
                continue;
            }

            evidence.post_ids.push(post_a.id.clone());
            evidence.post_ids.push(post_b.id.clone());
            evidence.time_delta_seconds = Some(delta);

            let text_sim = match text_similarity((post_a, idx_a), (post_b, idx_b), embeddings) {
                Some(sim) => {
                    evidence.text_similarity =
                        Some(evidence.text_similarity.map_or(sim, |m| m.max(sim)));
                    sim
                }
                None => 0.0,
            };

            let domain_sim = jaccard(&post_a.domains, &post_b.domains);
            evidence
                .shared_domains
                .extend(post_a.domains.intersection(&post_b.domains).cloned());

            let hashtag_sim = jaccard(&post_a.hashtags, &post_b.hashtags);
            evidence
                .shared_hashtags
                .extend(post_a.hashtags.intersection(&post_b.hashtags).cloned());

            let score = config.text_weight * text_sim
                + config.domain_weight * domain_sim
                + config.hashtag_weight * hashtag_sim;
            best = Some(best.map_or(score, |b| b.max(score)));
        }
    }

    match best {
        None => (0.0, CoordinationEvidence::default()),
        Some(score) => {
            dedup_in_place(&mut evidence.post_ids);
            dedup_in_place(&mut evidence.shared_domains);
            dedup_in_place(&mut evidence.shared_hashtags);
            (score, evidence)
        }
    }
}

fn text_similarity(
    a: IndexedPost<'_>,
    b: IndexedPost<'_>,
    embeddings: Option<&[Vec<f64>]>,
) -> Option<f64> {
    match embeddings {
        Some(matrix) => {
            let (ea, eb) = (matrix.get(a.1)?, matrix.get(b.1)?);
            Some(cosine_similarity(ea, eb))
        }
        None => {
            let (ea, eb) = (a.0.embedding.as_ref()?, b.0.embedding.as_ref()?);
            Some(cosine_similarity(ea, eb))
        }
    }
}

/// |A ∩ B| / |A ∪ B|, with an empty union scoring 0.0.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Drop repeats, keeping the first occurrence of each value.
fn dedup_in_place(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}
