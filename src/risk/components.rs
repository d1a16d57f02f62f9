// Risk components — independent heuristics, each mapping a narrative's posts
// to a score in 0.0-1.0.
//
// Every function is total: empty input returns 0.0, divisions are guarded,
// and the result is capped at 1.0 and rounded to 4 decimals.

use std::collections::{BTreeMap, HashSet};

use super::round4;
use crate::models::{CoordinatedGroup, Post};

/// 10 posts/hour saturates the base velocity score.
const VELOCITY_SATURATION_PER_HOUR: f64 = 10.0;
/// Trailing window used to find burst anchors (15 minutes).
const BURST_WINDOW_SECS: i64 = 15 * 60;
/// Posts (anchor included) within the window that make a burst.
const BURST_MIN_POSTS: usize = 5;
const BURST_WEIGHT: f64 = 0.2;

/// Posting-rate score for a narrative.
///
/// Fewer than 2 posts score 0.0; posts all sharing one timestamp score 1.0.
/// Otherwise `min(posts_per_hour / 10, 1)` plus up to 0.2 for the share of
/// posts that start a burst (5+ posts within the next 15 minutes).
pub fn velocity_score(posts: &[&Post]) -> f64 {
    if posts.len() < 2 {
        return 0.0;
    }

    let mut timestamps: Vec<i64> = posts.iter().map(|p| p.timestamp.timestamp()).collect();
    timestamps.sort_unstable();

    let span_secs = timestamps[timestamps.len() - 1] - timestamps[0];
    if span_secs <= 0 {
        return 1.0;
    }

    let posts_per_hour = posts.len() as f64 / (span_secs as f64 / 3600.0);
    let base = (posts_per_hour / VELOCITY_SATURATION_PER_HOUR).min(1.0);

    let burst_anchors = timestamps
        .iter()
        .enumerate()
        .filter(|&(i, &start)| {
            timestamps[i..]
                .iter()
                .take_while(|&&ts| ts - start <= BURST_WINDOW_SECS)
                .count()
                >= BURST_MIN_POSTS
        })
        .count();
    let burst_ratio = burst_anchors as f64 / timestamps.len() as f64;

    round4((base + burst_ratio * BURST_WEIGHT).min(1.0))
}

/// How much of a narrative's author base sits in coordination groups.
///
/// `0.6 * coordinated_author_ratio + 0.4 * size-weighted mean group score`.
/// Narratives with one author or none, or with no group touching them,
/// score 0.0.
pub fn coordination_density_score(
    narrative_id: &str,
    groups: &[CoordinatedGroup],
    total_authors: usize,
) -> f64 {
    if total_authors <= 1 {
        return 0.0;
    }

    let relevant: Vec<&CoordinatedGroup> = groups
        .iter()
        .filter(|g| g.narrative_ids.iter().any(|n| n == narrative_id))
        .collect();
    if relevant.is_empty() {
        return 0.0;
    }

    let mut coordinated: HashSet<&str> = HashSet::new();
    let mut weighted_score = 0.0;
    for group in &relevant {
        coordinated.extend(group.author_ids.iter().map(String::as_str));
        weighted_score += group.score * group.size as f64;
    }

    if coordinated.is_empty() {
        return 0.0;
    }

    let ratio = coordinated.len() as f64 / total_authors as f64;
    let avg_group_score = weighted_score / coordinated.len() as f64;

    round4((ratio * 0.6 + avg_group_score * 0.4).min(1.0))
}

/// Share of distinct linked domains that end in a foreign TLD.
pub fn foreign_domain_score(posts: &[&Post], foreign_tlds: &[String]) -> f64 {
    let all: HashSet<&str> = posts
        .iter()
        .flat_map(|p| p.domains.iter().map(String::as_str))
        .collect();
    if all.is_empty() {
        return 0.0;
    }

    let foreign = all
        .iter()
        .filter(|d| foreign_tlds.iter().any(|tld| d.ends_with(tld.as_str())))
        .count();

    round4((foreign as f64 / all.len() as f64).min(1.0))
}

const BOT_RATE_PER_HOUR: f64 = 20.0;
const BOT_MIN_UNIQUE_TEXT_RATIO: f64 = 0.5;
const BOT_MAX_INTERVAL_DISPERSION: f64 = 0.1;
const BOT_MIN_URL_RATIO: f64 = 0.8;

/// Average bot-likeness over authors with at least 2 posts.
///
/// Per author, indicators add up (capped at 1.0):
/// - +0.3 posting faster than 20 posts/hour
/// - +0.3 fewer than half the texts distinct (3+ posts)
/// - +0.2 near-constant posting interval, variance/mean below 0.1 (3+ posts)
/// - +0.2 more than 80% of posts carry a URL
pub fn bot_score(posts: &[&Post]) -> f64 {
    // BTreeMap so the average sums in a fixed order
    let mut by_author: BTreeMap<&str, Vec<&Post>> = BTreeMap::new();
    for &post in posts {
        by_author.entry(post.author_id.as_str()).or_default().push(post);
    }

    let per_author: Vec<f64> = by_author
        .values()
        .filter(|author_posts| author_posts.len() >= 2)
        .map(|author_posts| author_bot_indicators(author_posts))
        .collect();

    if per_author.is_empty() {
        return 0.0;
    }

    round4((per_author.iter().sum::<f64>() / per_author.len() as f64).min(1.0))
}

fn author_bot_indicators(posts: &[&Post]) -> f64 {
    let n = posts.len();
    let mut score = 0.0;

    let mut timestamps: Vec<i64> = posts.iter().map(|p| p.timestamp.timestamp()).collect();
    timestamps.sort_unstable();

    let span_secs = timestamps[n - 1] - timestamps[0];
    if span_secs > 0 {
        let per_hour = n as f64 / (span_secs as f64 / 3600.0);
        if per_hour > BOT_RATE_PER_HOUR {
            score += 0.3;
        }
    }

    if n >= 3 {
        let distinct: HashSet<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        if (distinct.len() as f64 / n as f64) < BOT_MIN_UNIQUE_TEXT_RATIO {
            score += 0.3;
        }

        let intervals: Vec<f64> = timestamps.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
        let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
        if mean > 0.0 {
            let variance =
                intervals.iter().map(|i| (i - mean).powi(2)).sum::<f64>() / intervals.len() as f64;
            if variance / mean < BOT_MAX_INTERVAL_DISPERSION {
                score += 0.2;
            }
        }
    }

    let with_urls = posts.iter().filter(|p| !p.urls.is_empty()).count();
    if (with_urls as f64 / n as f64) > BOT_MIN_URL_RATIO {
        score += 0.2;
    }

    f64::min(score, 1.0)
}
