// Run records — what the database stores about each pipeline invocation.
//
// Pairs, groups and risks reuse the crate-level models; only the run
// bookkeeping needs its own row types.

use serde::{Deserialize, Serialize};

/// Counts for a run about to be recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRun {
    pub input_path: Option<String>,
    pub post_count: usize,
    pub dead_letter_count: usize,
    pub narrative_count: usize,
    pub pair_count: usize,
    pub group_count: usize,
    pub high_risk_count: usize,
}

/// A stored run, as read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: i64,
    pub started_at: String,
    pub input_path: Option<String>,
    pub post_count: usize,
    pub dead_letter_count: usize,
    pub narrative_count: usize,
    pub pair_count: usize,
    pub group_count: usize,
    pub high_risk_count: usize,
}
