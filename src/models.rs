// Data models — the records that flow through the pipeline.
//
// Posts come in from ingestion; pairs, groups and risks come out of the
// coordination and risk modules. Everything here is a plain value so the
// scoring code never depends on rusqlite or the CLI.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Narrative ID assigned to posts the clustering stage could not place.
/// Posts carrying it are ignored by coordination and risk scoring.
pub const NOISE_NARRATIVE: &str = "noise";

/// A normalized, enriched post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub author_id: String,
    pub text: String,
    #[serde(default)]
    pub urls: Vec<String>,
    /// Distinct domains linked from the post (lower-cased, no `www.`)
    #[serde(default)]
    pub domains: BTreeSet<String>,
    /// Distinct hashtags without the `#`, lower-cased
    #[serde(default)]
    pub hashtags: BTreeSet<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f64>>,
    #[serde(default)]
    pub narrative_id: Option<String>,
}

impl Post {
    /// The narrative this post counts toward, or None for unassigned and
    /// noise posts.
    pub fn scored_narrative(&self) -> Option<&str> {
        match self.narrative_id.as_deref() {
            Some(NOISE_NARRATIVE) | None => None,
            Some(id) => Some(id),
        }
    }
}

/// Metadata for one narrative cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    pub id: String,
    pub size: usize,
    pub author_count: usize,
    pub top_domains: Vec<String>,
    pub top_hashtags: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// What connected two authors: the temporally close posts and what they shared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinationEvidence {
    pub post_ids: Vec<String>,
    pub shared_domains: Vec<String>,
    pub shared_hashtags: Vec<String>,
    /// Highest embedding similarity across the qualifying post pairs
    pub text_similarity: Option<f64>,
    /// Time delta of the last qualifying post pair examined
    pub time_delta_seconds: Option<f64>,
}

/// Two authors whose behavior within one narrative crossed the similarity threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatedPair {
    pub author1_id: String,
    pub author2_id: String,
    pub score: f64,
    pub evidence: CoordinationEvidence,
    pub narrative_id: String,
}

/// A connected component of coordinated authors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatedGroup {
    pub id: String,
    pub author_ids: Vec<String>,
    pub score: f64,
    pub evidence_summary: String,
    pub narrative_ids: Vec<String>,
    pub size: usize,
}

/// The five independent risk signals, each in 0.0-1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskComponents {
    pub velocity: f64,
    pub coordination_density: f64,
    pub bot_score: f64,
    pub foreign_domain_ratio: f64,
    pub toxicity: f64,
}

/// Discrete risk level derived from the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Map a score onto a level using ascending medium/high thresholds.
    pub fn from_score(score: f64, medium: f64, high: f64) -> Self {
        if score >= high {
            RiskLevel::High
        } else if score >= medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    /// Parse the stored string form. Unknown values fall back to Low.
    pub fn parse(s: &str) -> Self {
        match s {
            "HIGH" => RiskLevel::High,
            "MEDIUM" => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk assessment for one narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRisk {
    pub narrative_id: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub components: RiskComponents,
    pub reasons: Vec<String>,
}
