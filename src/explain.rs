// Explanations — template-generated plain-language summaries.
//
// Each explanation is three paragraphs built only from the computed records,
// plus the facts they were built from as JSON so a reader can check them.

use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{CoordinatedGroup, Narrative, NarrativeRisk, RiskLevel};

/// Components above this add a named factor to the narrative explanation.
const FACTOR_THRESHOLD: f64 = 0.3;
/// Velocity has its own, higher bar.
const VELOCITY_FACTOR_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub target_id: String,
    /// "narrative" or "coordination_group"
    pub target_type: String,
    pub text: String,
    pub facts: Value,
    pub model_info: String,
}

pub fn explain_narrative(narrative: &Narrative, risk: &NarrativeRisk) -> Explanation {
    let hashtags = if narrative.top_hashtags.is_empty() {
        "no specific hashtags".to_string()
    } else {
        narrative
            .top_hashtags
            .iter()
            .take(3)
            .map(|h| format!("#{h}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let domains = if narrative.top_domains.is_empty() {
        "various sources".to_string()
    } else {
        narrative.top_domains.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
    };

    let overview = format!(
        "This narrative ({}) consists of {} posts. The conversation primarily uses \
         hashtags like {hashtags} and shares content from domains including {domains}.",
        narrative.id, narrative.size
    );

    let mut reach = format!("The narrative involves {} unique authors", narrative.author_count);
    if let (Some(start), Some(end)) = (narrative.start_time, narrative.end_time) {
        let hours = (end - start).num_seconds() as f64 / 3600.0;
        if hours < 24.0 {
            reach.push_str(&format!(" over {hours:.1} hours"));
        } else {
            reach.push_str(&format!(" over {:.1} days", hours / 24.0));
        }
    }
    reach.push('.');

    let c = &risk.components;
    if c.velocity > VELOCITY_FACTOR_THRESHOLD {
        reach.push_str(" The posting rate indicates rapid spread of this content.");
    }

    let mut factors = Vec::new();
    if c.coordination_density > FACTOR_THRESHOLD {
        factors.push("coordinated behavior among accounts");
    }
    if c.bot_score > FACTOR_THRESHOLD {
        factors.push("bot-like activity patterns");
    }
    if c.foreign_domain_ratio > FACTOR_THRESHOLD {
        factors.push("significant foreign domain presence");
    }
    if c.toxicity > FACTOR_THRESHOLD {
        factors.push("potentially toxic content");
    }
    if c.velocity > VELOCITY_FACTOR_THRESHOLD {
        factors.push("unusually high posting velocity");
    }

    let mut assessment = format!(
        "This narrative presents {} risk (score: {:.2}). ",
        risk.risk_level, risk.risk_score
    );
    if factors.is_empty() {
        assessment.push_str("No significant risk factors were identified.");
    } else {
        assessment.push_str(&format!("Key risk factors include: {}.", factors.join(", ")));
    }

    Explanation {
        target_id: narrative.id.clone(),
        target_type: "narrative".to_string(),
        text: [overview, reach, assessment].join("\n\n"),
        facts: json!({
            "narrative_id": narrative.id,
            "size": narrative.size,
            "author_count": narrative.author_count,
            "top_domains": narrative.top_domains,
            "top_hashtags": narrative.top_hashtags,
            "risk_score": risk.risk_score,
            "risk_level": risk.risk_level,
            "risk_components": risk.components,
        }),
        model_info: "template-based".to_string(),
    }
}

pub fn explain_group(group: &CoordinatedGroup) -> Explanation {
    let overview = format!(
        "A coordinated group ({}) of {} accounts has been detected with a coordination \
         score of {:.2}. These accounts exhibit synchronized behavior patterns that \
         suggest potential coordinated influence operations.",
        group.id, group.size, group.score
    );

    let sample: Vec<&str> = group.author_ids.iter().take(5).map(String::as_str).collect();
    let mut accounts = format!("Accounts in this group include: {}", sample.join(", "));
    let remaining = group.size.saturating_sub(sample.len());
    if remaining > 0 {
        accounts.push_str(&format!(" and {remaining} others"));
    }
    accounts.push('.');
    if !group.narrative_ids.is_empty() {
        let narratives: Vec<&str> = group.narrative_ids.iter().take(3).map(String::as_str).collect();
        accounts.push_str(&format!(
            " This group is active in narratives: {}.",
            narratives.join(", ")
        ));
    }

    let evidence = format!(
        "Evidence of coordination: {}. {}",
        group.evidence_summary,
        if group.score >= 0.9 {
            "The very high score means near-identical content posted in close succession."
        } else {
            "These accounts repeatedly shared similar content within the same time window."
        }
    );

    Explanation {
        target_id: group.id.clone(),
        target_type: "coordination_group".to_string(),
        text: [overview, accounts, evidence].join("\n\n"),
        facts: json!({
            "group_id": group.id,
            "size": group.size,
            "score": group.score,
            "author_ids": group.author_ids.iter().take(10).collect::<Vec<_>>(),
            "narrative_ids": group.narrative_ids,
        }),
        model_info: "template-based".to_string(),
    }
}

/// Short label used when listing explanations.
pub fn level_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "needs review",
        RiskLevel::Medium => "monitor",
        RiskLevel::Low => "no action",
    }
}
