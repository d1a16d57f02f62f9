// Hashing embedder — local bag-of-words vectors, no model files.
//
// Each token (lower-cased, stop words removed) is hashed into one of
// `dimension` buckets and counted; the vector is then L2-normalized so
// cosine similarity reduces to a dot product. Near-duplicate posts land
// close together, which is what coordination detection cares about.
// It does not understand synonyms; a sentence model behind TextEmbedder
// would.

use std::collections::HashSet;

use anyhow::Result;
use stop_words::{get, LANGUAGE};

use super::traits::TextEmbedder;

pub const DEFAULT_DIMENSION: usize = 256;

pub struct HashingEmbedder {
    dimension: usize,
    stop_words: HashSet<String>,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let stop_words: HashSet<String> = get(LANGUAGE::English).into_iter().collect();
        Self {
            dimension: dimension.max(1),
            stop_words,
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0_f64; self.dimension];

        for token in tokenize(text) {
            if token.chars().count() < 2 || self.stop_words.contains(&token) {
                continue;
            }
            let bucket = (fnv1a(token.as_bytes()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl TextEmbedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Lower-case alphanumeric runs; everything else separates tokens.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// 64-bit FNV-1a. Stable across runs and platforms, unlike the std hasher.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
