// Analysis run: coordination detection and risk scoring, then storage.
//
// Storage failures are logged and reported on the outcome; they never
// change the pairs, groups or risks that were computed.

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::coordination::CoordinationDetector;
use crate::db::models::NewRun;
use crate::db::Database;
use crate::models::{CoordinatedGroup, CoordinatedPair, Narrative, NarrativeRisk, Post, RiskLevel};
use crate::narratives;
use crate::risk::RiskEngine;

/// Bookkeeping about where the posts came from, recorded with the run.
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    pub input_path: Option<String>,
    pub dead_letter_count: usize,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub narratives: Vec<Narrative>,
    pub pairs: Vec<CoordinatedPair>,
    pub groups: Vec<CoordinatedGroup>,
    pub risks: Vec<NarrativeRisk>,
    /// Set when the results were stored
    pub run_id: Option<i64>,
    /// Set when storage was requested and failed
    pub persist_error: Option<String>,
}

impl RunOutcome {
    pub fn high_risk_count(&self) -> usize {
        self.risks
            .iter()
            .filter(|r| r.risk_level == RiskLevel::High)
            .count()
    }
}

/// Run the analysis with the default risk engine.
///
/// `embeddings` rows must line up with `posts` by position.
pub async fn run(
    posts: &[Post],
    embeddings: Option<&[Vec<f64>]>,
    config: &Config,
    db: Option<&dyn Database>,
    input: &RunInput,
) -> RunOutcome {
    let engine = RiskEngine::new(config.risk.clone());
    run_with_engine(posts, embeddings, config, &engine, db, input).await
}

/// Run the analysis with a caller-supplied risk engine (e.g. a different
/// toxicity scorer).
pub async fn run_with_engine(
    posts: &[Post],
    embeddings: Option<&[Vec<f64>]>,
    config: &Config,
    engine: &RiskEngine,
    db: Option<&dyn Database>,
    input: &RunInput,
) -> RunOutcome {
    let narratives = narratives::summarize(posts);
    info!(
        posts = posts.len(),
        narratives = narratives.len(),
        "Analysis started"
    );

    let detector = CoordinationDetector::new(config.coordination.clone());
    let (pairs, groups) = detector.detect(posts, embeddings);
    let risks = engine.calculate_all(posts, &narratives, &groups);

    let mut outcome = RunOutcome {
        narratives,
        pairs,
        groups,
        risks,
        run_id: None,
        persist_error: None,
    };

    if let Some(db) = db {
        match persist(db, &outcome, posts.len(), input).await {
            Ok(run_id) => {
                info!(run_id, "Results stored");
                outcome.run_id = Some(run_id);
            }
            Err(e) => {
                warn!(error = %e, "Failed to store results; continuing with in-memory results");
                outcome.persist_error = Some(format!("{e:#}"));
            }
        }
    }

    outcome
}

async fn persist(
    db: &dyn Database,
    outcome: &RunOutcome,
    post_count: usize,
    input: &RunInput,
) -> Result<i64> {
    let run_id = db
        .record_run(&NewRun {
            input_path: input.input_path.clone(),
            post_count,
            dead_letter_count: input.dead_letter_count,
            narrative_count: outcome.narratives.len(),
            pair_count: outcome.pairs.len(),
            group_count: outcome.groups.len(),
            high_risk_count: outcome.high_risk_count(),
        })
        .await?;
    db.save_pairs(run_id, &outcome.pairs).await?;
    db.save_groups(run_id, &outcome.groups).await?;
    db.save_risks(run_id, &outcome.risks).await?;
    db.complete_run(run_id).await?;
    Ok(run_id)
}
