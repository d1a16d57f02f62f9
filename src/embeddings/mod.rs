// Text embeddings — the injected capability behind text similarity.
//
// The coordination detector never calls an embedding model itself. Callers
// produce an embedding matrix (one row per post, aligned with the post list)
// through a TextEmbedder and hand it to the detector. Without a matrix, or
// without per-post embeddings, text similarity contributes nothing.

pub mod hashing;
pub mod traits;

/// Cosine similarity between two embedding vectors.
///
/// Returns -1.0 to 1.0. Mismatched dimensions or zero-magnitude vectors
/// score 0.0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}
