// Risk engine — weighted combination of the five components.
//
// risk_score = Σ weight_i * component_i, rounded to 4 decimals and NOT
// clamped: weights that sum past 1.0 can push it above 1.0. The level comes
// from the medium/high thresholds, and every component at or above 0.3 gets
// a reason line.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info};

use super::components::{
    bot_score, coordination_density_score, foreign_domain_score, velocity_score,
};
use super::round4;
use super::toxicity::{KeywordToxicityScorer, ToxicityScorer};
use crate::config::{RiskConfig, RiskWeights};
use crate::models::{
    CoordinatedGroup, Narrative, NarrativeRisk, Post, RiskComponents, RiskLevel,
};

/// Components below this value are not mentioned in the reasons.
pub const REASON_THRESHOLD: f64 = 0.3;

pub const NO_RISK_REASON: &str = "No significant risk factors identified";

pub struct RiskEngine {
    config: RiskConfig,
    toxicity: Box<dyn ToxicityScorer>,
}

impl RiskEngine {
    /// Engine with the keyword toxicity heuristic.
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            toxicity: Box::new(KeywordToxicityScorer),
        }
    }

    /// Replace the toxicity scorer.
    pub fn with_toxicity(mut self, scorer: Box<dyn ToxicityScorer>) -> Self {
        self.toxicity = scorer;
        self
    }

    /// Compute the five components for one narrative.
    pub fn components(
        &self,
        narrative: &Narrative,
        posts: &[&Post],
        groups: &[CoordinatedGroup],
    ) -> RiskComponents {
        RiskComponents {
            velocity: velocity_score(posts),
            coordination_density: coordination_density_score(
                &narrative.id,
                groups,
                narrative.author_count,
            ),
            bot_score: bot_score(posts),
            foreign_domain_ratio: foreign_domain_score(posts, &self.config.foreign_tlds),
            toxicity: self.toxicity.score(posts),
        }
    }

    /// Assess a single narrative given its posts and all coordination groups.
    pub fn calculate_risk(
        &self,
        narrative: &Narrative,
        posts: &[&Post],
        groups: &[CoordinatedGroup],
    ) -> NarrativeRisk {
        let components = self.components(narrative, posts, groups);
        let weights = &self.config.weights;
        let thresholds = &self.config.thresholds;

        let risk_score = round4(weighted_sum(&components, weights));
        let risk_level = RiskLevel::from_score(risk_score, thresholds.medium, thresholds.high);

        debug!(
            narrative = narrative.id.as_str(),
            score = risk_score,
            level = risk_level.as_str(),
            "Scored narrative"
        );

        NarrativeRisk {
            narrative_id: narrative.id.clone(),
            risk_score,
            risk_level,
            components,
            reasons: generate_reasons(&components, weights),
        }
    }

    /// Assess every narrative that has posts, highest risk first.
    ///
    /// Narratives with no (non-noise) posts are skipped. Equal scores keep
    /// the order of `narratives`.
    pub fn calculate_all(
        &self,
        posts: &[Post],
        narratives: &[Narrative],
        groups: &[CoordinatedGroup],
    ) -> Vec<NarrativeRisk> {
        info!(narrative_count = narratives.len(), "Risk calculation started");

        let mut by_narrative: HashMap<&str, Vec<&Post>> = HashMap::new();
        for post in posts {
            if let Some(id) = post.scored_narrative() {
                by_narrative.entry(id).or_default().push(post);
            }
        }

        let mut risks: Vec<NarrativeRisk> = narratives
            .par_iter()
            .filter_map(|narrative| {
                let narrative_posts = by_narrative.get(narrative.id.as_str())?;
                Some(self.calculate_risk(narrative, narrative_posts, groups))
            })
            .collect();

        risks.sort_by(|a, b| {
            b.risk_score
                .partial_cmp(&a.risk_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(
            narrative_count = risks.len(),
            high_risk_count = risks
                .iter()
                .filter(|r| r.risk_level == RiskLevel::High)
                .count(),
            "Risk calculation completed"
        );

        risks
    }
}

fn weighted_sum(c: &RiskComponents, w: &RiskWeights) -> f64 {
    w.velocity * c.velocity
        + w.coordination_density * c.coordination_density
        + w.bot_score * c.bot_score
        + w.foreign_domain_ratio * c.foreign_domain_ratio
        + w.toxicity * c.toxicity
}

/// One line per component at or above the reporting threshold, in fixed
/// order, naming the value and its weighted contribution.
pub fn generate_reasons(c: &RiskComponents, w: &RiskWeights) -> Vec<String> {
    let factors = [
        ("High posting velocity", c.velocity, w.velocity),
        (
            "Coordinated behavior detected",
            c.coordination_density,
            w.coordination_density,
        ),
        ("Bot-like activity patterns", c.bot_score, w.bot_score),
        (
            "High foreign domain ratio",
            c.foreign_domain_ratio,
            w.foreign_domain_ratio,
        ),
        ("Toxic content indicators", c.toxicity, w.toxicity),
    ];

    let mut reasons: Vec<String> = factors
        .iter()
        .filter(|(_, value, _)| *value >= REASON_THRESHOLD)
        .map(|(label, value, weight)| {
            format!(
                "{label} ({value:.2}) - contributes {:.2} to risk",
                value * weight
            )
        })
        .collect();

    if reasons.is_empty() {
        reasons.push(NO_RISK_REASON.to_string());
    }

    reasons
}
