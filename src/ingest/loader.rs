// JSONL loader — one raw post per line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use super::normalize::Normalizer;
use crate::models::Post;

/// A post as it appears in the input file, before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub id: String,
    pub timestamp: String,
    pub author_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub narrative_id: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f64>>,
}

/// A line that could not be turned into a post.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    /// 1-based line number
    pub line: usize,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub posts: Vec<Post>,
    pub dead_letters: Vec<DeadLetter>,
}

/// Load and normalize posts from a JSONL file.
pub fn load_jsonl(path: &Path) -> Result<LoadReport> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file {}", path.display()))?;
    let report = parse_jsonl(BufReader::new(file))?;

    info!(
        path = %path.display(),
        posts = report.posts.len(),
        dead_letters = report.dead_letters.len(),
        "Loaded posts"
    );
    Ok(report)
}

/// Parse JSONL from any reader. Blank lines are ignored; malformed records
/// become dead letters. Only read errors abort.
pub fn parse_jsonl<R: BufRead>(reader: R) -> Result<LoadReport> {
    let normalizer = Normalizer::new()?;
    let mut report = LoadReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let parsed = serde_json::from_str::<RawPost>(&line)
            .map_err(anyhow::Error::from)
            .and_then(|raw| normalizer.normalize(raw));

        match parsed {
            Ok(post) => report.posts.push(post),
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed record");
                report.dead_letters.push(DeadLetter {
                    line: line_no,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
