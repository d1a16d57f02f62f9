// Embedding step: build the post-aligned embedding matrix.
//
// Posts that arrived with a precomputed vector keep it; the rest are embedded
// in batches with the injected TextEmbedder. Row i always belongs to post i.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::embeddings::traits::TextEmbedder;
use crate::models::Post;

pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Produce one embedding per post, in post order.
///
/// Fails if the embedder returns the wrong number of vectors for a batch.
pub fn embed_posts(
    embedder: &dyn TextEmbedder,
    posts: &[Post],
    batch_size: usize,
    show_progress: bool,
) -> Result<Vec<Vec<f64>>> {
    let mut matrix: Vec<Option<Vec<f64>>> = posts.iter().map(|p| p.embedding.clone()).collect();
    let missing: Vec<usize> = matrix
        .iter()
        .enumerate()
        .filter(|(_, row)| row.is_none())
        .map(|(i, _)| i)
        .collect();

    info!(
        precomputed = posts.len() - missing.len(),
        to_embed = missing.len(),
        dimension = embedder.dimension(),
        "Embedding posts"
    );

    let pb = if show_progress && !missing.is_empty() {
        let pb = ProgressBar::new(missing.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Embedding [{bar:30}] {pos}/{len} ({eta})")
                .context("Invalid progress bar template")?,
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    for chunk in missing.chunks(batch_size.max(1)) {
        let texts: Vec<String> = chunk.iter().map(|&i| posts[i].text.clone()).collect();
        let vectors = embedder.embed(&texts)?;
        if vectors.len() != chunk.len() {
            anyhow::bail!(
                "Embedder returned {} vectors for a batch of {} texts",
                vectors.len(),
                chunk.len()
            );
        }
        for (&i, vector) in chunk.iter().zip(vectors) {
            matrix[i] = Some(vector);
        }
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    Ok(matrix.into_iter().map(Option::unwrap_or_default).collect())
}
