// Toxicity scorer trait — the swap-ready abstraction.
//
// The default implementation is a keyword-density heuristic. A model-backed
// classifier can implement ToxicityScorer and be handed to the RiskEngine
// without touching the rest of the scoring pipeline.

use super::round4;
use crate::models::Post;

/// Trait for scoring the toxicity of a narrative's posts, 0.0 to 1.0.
pub trait ToxicityScorer: Send + Sync {
    fn score(&self, posts: &[&Post]) -> f64;
}

/// Keywords counted as toxic by the default heuristic.
pub const TOXIC_KEYWORDS: &[&str] = &[
    "hate",
    "kill",
    "die",
    "attack",
    "destroy",
    "enemy",
    "threat",
    "dangerous",
    "evil",
    "corrupt",
    "conspiracy",
    "hoax",
    "fake",
    "propaganda",
    "lies",
    "traitor",
    "invasion",
    "war",
];

/// A 5% toxic-token density saturates the score.
const SATURATION_DENSITY: f64 = 0.05;

/// Keyword-density toxicity: toxic tokens / all tokens, scaled so 5% = 1.0.
///
/// Tokens are whitespace-separated, lower-cased, with non-alphanumeric
/// characters stripped before matching.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordToxicityScorer;

impl ToxicityScorer for KeywordToxicityScorer {
    fn score(&self, posts: &[&Post]) -> f64 {
        let mut total = 0usize;
        let mut toxic = 0usize;

        for post in posts {
            for word in post.text.split_whitespace() {
                total += 1;
                let clean: String = word
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .flat_map(char::to_lowercase)
                    .collect();
                if TOXIC_KEYWORDS.contains(&clean.as_str()) {
                    toxic += 1;
                }
            }
        }

        if total == 0 {
            return 0.0;
        }

        let density = toxic as f64 / total as f64;
        round4((density / SATURATION_DENSITY).min(1.0))
    }
}
