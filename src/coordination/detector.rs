// Pairwise coordination detector.
//
// Posts are partitioned by narrative, then by author. Every unordered pair of
// authors inside a narrative is scored with the evidence calculator; pairs at
// or above the similarity threshold are kept. Narratives are independent, so
// they are scored in parallel and reassembled in first-appearance order.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use tracing::{debug, info};

use super::evidence::{score_pair, IndexedPost};
use super::groups::build_groups;
use crate::config::CoordinationConfig;
use crate::models::{CoordinatedGroup, CoordinatedPair, Post};

pub struct CoordinationDetector {
    config: CoordinationConfig,
}

impl CoordinationDetector {
    pub fn new(config: CoordinationConfig) -> Self {
        Self { config }
    }

    /// Find coordinated pairs across all narratives, then group them.
    ///
    /// `embeddings` rows must line up with `posts` by position.
    pub fn detect(
        &self,
        posts: &[Post],
        embeddings: Option<&[Vec<f64>]>,
    ) -> (Vec<CoordinatedPair>, Vec<CoordinatedGroup>) {
        info!(post_count = posts.len(), "Coordination detection started");

        let pairs = self.detect_pairs(posts, embeddings);
        let groups = build_groups(&pairs, self.config.min_group_size);

        info!(
            pairs = pairs.len(),
            groups = groups.len(),
            "Coordination detection completed"
        );

        (pairs, groups)
    }

    /// Score every author pair in every narrative and keep those at or above
    /// the similarity threshold. Output order is narrative first-appearance
    /// order, then sorted author order within each narrative.
    pub fn detect_pairs(
        &self,
        posts: &[Post],
        embeddings: Option<&[Vec<f64>]>,
    ) -> Vec<CoordinatedPair> {
        let partitions: Vec<(&str, Vec<IndexedPost<'_>>)> = partition_by_narrative(posts)
            .into_iter()
            .filter(|(_, narrative_posts)| narrative_posts.len() >= 2)
            .collect();

        partitions
            .par_iter()
            .map(|(narrative_id, narrative_posts)| {
                self.pairs_in_narrative(narrative_id, narrative_posts, embeddings)
            })
            .collect::<Vec<Vec<CoordinatedPair>>>()
            .into_iter()
            .flatten()
            .collect()
    }

    fn pairs_in_narrative(
        &self,
        narrative_id: &str,
        narrative_posts: &[IndexedPost<'_>],
        embeddings: Option<&[Vec<f64>]>,
    ) -> Vec<CoordinatedPair> {
        // BTreeMap keeps authors sorted so pair order is reproducible
        let mut by_author: BTreeMap<&str, Vec<IndexedPost<'_>>> = BTreeMap::new();
        for &(post, idx) in narrative_posts {
            by_author
                .entry(post.author_id.as_str())
                .or_default()
                .push((post, idx));
        }

        let authors: Vec<(&str, &Vec<IndexedPost<'_>>)> =
            by_author.iter().map(|(a, p)| (*a, p)).collect();
        let mut pairs = Vec::new();

        for (i, &(author1, posts1)) in authors.iter().enumerate() {
            for &(author2, posts2) in &authors[i + 1..] {
                let (score, evidence) = score_pair(posts1, posts2, embeddings, &self.config);
                if score >= self.config.similarity_threshold {
                    pairs.push(CoordinatedPair {
                        author1_id: author1.to_string(),
                        author2_id: author2.to_string(),
                        score,
                        evidence,
                        narrative_id: narrative_id.to_string(),
                    });
                }
            }
        }

        debug!(
            narrative = narrative_id,
            authors = authors.len(),
            pairs = pairs.len(),
            "Scored narrative author pairs"
        );

        pairs
    }
}

/// Group scorable posts by narrative, keeping each post's original index.
/// Narratives come back in the order they first appear in `posts`.
fn partition_by_narrative(posts: &[Post]) -> Vec<(&str, Vec<IndexedPost<'_>>)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut partitions: Vec<(&str, Vec<IndexedPost<'_>>)> = Vec::new();

    for (idx, post) in posts.iter().enumerate() {
        let Some(narrative_id) = post.scored_narrative() else {
            continue;
        };
        let slot = *slots.entry(narrative_id).or_insert_with(|| {
            partitions.push((narrative_id, Vec::new()));
            partitions.len() - 1
        });
        partitions[slot].1.push((post, idx));
    }

    partitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOISE_NARRATIVE;
    use chrono::{Duration, TimeZone, Utc};

    fn post(id: &str, author: &str, narrative: &str, minute: i64) -> Post {
        Post {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
                + Duration::minutes(minute),
            author_id: author.to_string(),
            text: "same text".to_string(),
            urls: vec![],
            domains: ["site.com".to_string()].into_iter().collect(),
            hashtags: ["tag".to_string()].into_iter().collect(),
            embedding: Some(vec![1.0, 0.0]),
            narrative_id: Some(narrative.to_string()),
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        let detector = CoordinationDetector::new(CoordinationConfig::default());
        let (pairs, groups) = detector.detect(&[], None);
        assert!(pairs.is_empty());
        assert!(groups.is_empty());
    }

    #[test]
    fn noise_posts_are_ignored() {
        let posts = vec![
            post("1", "a", NOISE_NARRATIVE, 0),
            post("2", "b", NOISE_NARRATIVE, 0),
        ];
        let detector = CoordinationDetector::new(CoordinationConfig::default());
        assert!(detector.detect_pairs(&posts, None).is_empty());
    }

    #[test]
    fn partitions_keep_first_appearance_order() {
        let posts = vec![
            post("1", "a", "n2", 0),
            post("2", "a", "n1", 0),
            post("3", "b", "n2", 0),
        ];
        let parts = partition_by_narrative(&posts);
        assert_eq!(parts[0].0, "n2");
        assert_eq!(parts[0].1.iter().map(|(_, i)| *i).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(parts[1].0, "n1");
    }

    #[test]
    fn pair_authors_are_in_sorted_order() {
        let posts = vec![post("1", "zed", "n1", 0), post("2", "amy", "n1", 1)];
        let detector = CoordinationDetector::new(CoordinationConfig::default());
        let pairs = detector.detect_pairs(&posts, None);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].author1_id, "amy");
        assert_eq!(pairs[0].author2_id, "zed");
        assert!((pairs[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn same_pair_in_two_narratives_is_reported_twice() {
        let posts = vec![
            post("1", "a", "n1", 0),
            post("2", "b", "n1", 0),
            post("3", "a", "n2", 0),
            post("4", "b", "n2", 0),
        ];
        let detector = CoordinationDetector::new(CoordinationConfig::default());
        let pairs = detector.detect_pairs(&posts, None);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].narrative_id, "n1");
        assert_eq!(pairs[1].narrative_id, "n2");
    }

    #[test]
    fn single_author_narrative_has_no_pairs() {
        let posts = vec![post("1", "a", "n1", 0), post("2", "a", "n1", 1)];
        let detector = CoordinationDetector::new(CoordinationConfig::default());
        assert!(detector.detect_pairs(&posts, None).is_empty());
    }
}
