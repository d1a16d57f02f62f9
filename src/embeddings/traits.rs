// Embedder trait — swap-ready abstraction for text embeddings.
//
// Like the toxicity scorer, this lets a sentence-transformer backend or a
// remote embedding API replace the local hashing embedder without touching
// coordination detection.

use anyhow::Result;

/// Trait for turning post texts into dense vectors.
pub trait TextEmbedder: Send + Sync {
    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, returning one vector per text in the same order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;
}
