// Colored terminal output for risk reports and coordination groups.
//
// main.rs gathers the data; this module decides how it looks.

use colored::Colorize;

use crate::coordination::report::{format_group_evidence, format_pair_evidence, EvidenceSummary};
use crate::explain::{level_label, Explanation};
use crate::models::{CoordinatedGroup, CoordinatedPair, NarrativeRisk, RiskLevel};

/// Display ranked narrative risks.
pub fn display_risk_list(risks: &[NarrativeRisk]) {
    if risks.is_empty() {
        println!("No narratives scored yet. Run `narrative-graph run --input <file>` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Narrative Risk Report ({} narratives) ===", risks.len()).bold()
    );
    println!();

    println!(
        "  {:>4}  {:<28} {:>6}  {:<8}  {:>5}  {:>5}  {:>5}  {:>5}  {:>5}",
        "Rank".dimmed(),
        "Narrative".dimmed(),
        "Score".dimmed(),
        "Level".dimmed(),
        "Vel".dimmed(),
        "Coord".dimmed(),
        "Bot".dimmed(),
        "Frgn".dimmed(),
        "Tox".dimmed(),
    );
    println!("  {}", "-".repeat(90).dimmed());

    for (i, risk) in risks.iter().enumerate() {
        let c = &risk.components;
        println!(
            "  {:>4}. {:<28} {:>6.3}  {:<8}  {:>5.2}  {:>5.2}  {:>5.2}  {:>5.2}  {:>5.2}",
            i + 1,
            super::truncate_chars(&risk.narrative_id, 25),
            risk.risk_score,
            colorize_level(risk.risk_level),
            c.velocity,
            c.coordination_density,
            c.bot_score,
            c.foreign_domain_ratio,
            c.toxicity,
        );
        for reason in &risk.reasons {
            println!("        {}", reason.dimmed());
        }
    }

    println!();

    let high = risks.iter().filter(|r| r.risk_level == RiskLevel::High).count();
    let medium = risks.iter().filter(|r| r.risk_level == RiskLevel::Medium).count();
    if high > 0 {
        println!("  {} {} high-risk narratives", "!!".red().bold(), high);
    }
    if medium > 0 {
        println!("  {} {} medium-risk narratives", "!".yellow(), medium);
    }
}

/// Display coordination groups. With `pairs`, each group also lists the
/// pair evidence behind it.
pub fn display_groups(groups: &[CoordinatedGroup], pairs: Option<&[CoordinatedPair]>) {
    if groups.is_empty() {
        println!("No coordination groups detected.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Coordination Groups ({}) ===", groups.len()).bold()
    );

    for group in groups {
        println!();
        match pairs {
            Some(pairs) => {
                for line in format_group_evidence(group, pairs).lines() {
                    println!("  {line}");
                }
            }
            None => {
                println!(
                    "  {}  score {}  size {}",
                    group.id.bold(),
                    colorize_score(group.score),
                    group.size
                );
                println!(
                    "    Authors: {}",
                    super::truncate_chars(&group.author_ids.join(", "), 100)
                );
                println!("    Narratives: {}", group.narrative_ids.join(", "));
            }
        }
    }
    println!();
}

/// Display the `limit` strongest pairs with their evidence.
pub fn display_top_pairs(pairs: &[CoordinatedPair], limit: usize) {
    let mut ranked: Vec<&CoordinatedPair> = pairs.iter().collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!(
        "\n{}",
        format!("=== Strongest Pairs ({} of {}) ===", ranked.len().min(limit), pairs.len()).bold()
    );
    for pair in ranked.into_iter().take(limit) {
        println!();
        for line in format_pair_evidence(pair).lines() {
            println!("  {line}");
        }
    }
    println!();
}

/// Display the run's evidence digest.
pub fn display_evidence_summary(summary: &EvidenceSummary) {
    println!("\n{}", "=== Coordination Evidence ===".bold());
    println!(
        "  {} pairs, {} groups",
        summary.total_pairs, summary.total_groups
    );

    if !summary.most_coordinated_authors.is_empty() {
        println!("\n  Most coordinated authors:");
        for author in &summary.most_coordinated_authors {
            println!(
                "    {:<30} {} pairs, avg {:.2}",
                author.author_id, author.pair_count, author.avg_score
            );
        }
    }

    if !summary.shared_domains.is_empty() {
        let domains: Vec<String> = summary
            .shared_domains
            .iter()
            .map(|(d, n)| format!("{d} ({n})"))
            .collect();
        println!("\n  Shared domains: {}", domains.join(", "));
    }
    if !summary.shared_hashtags.is_empty() {
        let tags: Vec<String> = summary
            .shared_hashtags
            .iter()
            .map(|(h, n)| format!("#{h} ({n})"))
            .collect();
        println!("  Shared hashtags: {}", tags.join(", "));
    }
}

/// Display a generated explanation under a heading.
pub fn display_explanation(explanation: &Explanation, level: Option<RiskLevel>) {
    let heading = match level {
        Some(level) => format!(
            "--- {} ({}, {}) ---",
            explanation.target_id,
            colorize_level(level),
            level_label(level)
        ),
        None => format!("--- {} ---", explanation.target_id),
    };
    println!("\n{}", heading.bold());
    for paragraph in explanation.text.split("\n\n") {
        println!("  {paragraph}\n");
    }
}

fn colorize_level(level: RiskLevel) -> colored::ColoredString {
    match level {
        RiskLevel::High => level.as_str().red().bold(),
        RiskLevel::Medium => level.as_str().yellow(),
        RiskLevel::Low => level.as_str().green(),
    }
}

fn colorize_score(score: f64) -> colored::ColoredString {
    let s = format!("{score:.2}");
    if score >= 0.95 {
        s.red().bold()
    } else if score >= 0.9 {
        s.bright_red()
    } else {
        s.yellow()
    }
}
