// Database trait — backend-agnostic async interface for run storage.
//
// Implementors: SqliteDatabase (wraps rusqlite). Methods are async so a
// natively async backend could slot in behind the same interface; the
// pipeline and CLI only ever hold a `dyn Database`.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{NewRun, RunSummary};
use crate::models::{CoordinatedGroup, CoordinatedPair, NarrativeRisk};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Runs ---

    /// Record a new run and return its ID.
    async fn record_run(&self, run: &NewRun) -> Result<i64>;

    /// Mark a run's results as fully written. Readers only see completed runs.
    async fn complete_run(&self, run_id: i64) -> Result<()>;

    /// The most recently completed run.
    async fn latest_run(&self) -> Result<Option<RunSummary>>;

    // --- Results ---

    async fn save_pairs(&self, run_id: i64, pairs: &[CoordinatedPair]) -> Result<()>;

    /// Groups are stored in the order given, which readers preserve.
    async fn save_groups(&self, run_id: i64, groups: &[CoordinatedGroup]) -> Result<()>;

    async fn save_risks(&self, run_id: i64, risks: &[NarrativeRisk]) -> Result<()>;

    /// Latest completed run's risks at or above `min_score`, ranked by score descending.
    async fn get_ranked_risks(&self, min_score: f64) -> Result<Vec<NarrativeRisk>>;

    /// Latest completed run's groups, ranked, at most `limit`.
    async fn get_groups(&self, limit: u32) -> Result<Vec<CoordinatedGroup>>;
}
