// Normalization — turn raw records into enriched posts.
//
// URLs are the union of the explicit list and any http(s) links in the text.
// Domains come from those URLs, lower-cased with a leading "www." removed.
// Hashtags are the union of the explicit list and #tags in the text, all
// lower-cased and stored without the '#'.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex_lite::Regex;
use url::{Host, Url};

use super::loader::RawPost;
use crate::models::Post;

pub struct Normalizer {
    url_pattern: Regex,
    hashtag_pattern: Regex,
}

impl Normalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            url_pattern: Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#)
                .context("Failed to compile URL pattern")?,
            hashtag_pattern: Regex::new(r"#(\w+)").context("Failed to compile hashtag pattern")?,
        })
    }

    /// Normalize one raw record. Fails only on an unparseable timestamp.
    pub fn normalize(&self, raw: RawPost) -> Result<Post> {
        let timestamp = parse_timestamp(&raw.timestamp)
            .with_context(|| format!("Post {} has invalid timestamp {:?}", raw.id, raw.timestamp))?;

        let mut urls = raw.urls;
        for m in self.url_pattern.find_iter(&raw.text) {
            let url = m.as_str().to_string();
            if !urls.contains(&url) {
                urls.push(url);
            }
        }

        let domains: BTreeSet<String> = urls.iter().filter_map(|u| extract_domain(u)).collect();

        let hashtags: BTreeSet<String> = raw
            .hashtags
            .iter()
            .map(|h| h.trim_start_matches('#').to_lowercase())
            .chain(
                self.hashtag_pattern
                    .captures_iter(&raw.text)
                    .filter_map(|c| c.get(1))
                    .map(|m| m.as_str().to_lowercase()),
            )
            .filter(|h| !h.is_empty())
            .collect();

        Ok(Post {
            id: raw.id,
            timestamp,
            author_id: raw.author_id,
            text: raw.text,
            urls,
            domains,
            hashtags,
            embedding: raw.embedding,
            narrative_id: raw.narrative_id,
        })
    }
}

/// Host part of a URL, lower-cased and without "www.". None if the URL
/// doesn't parse or has no host. IPv6 hosts come back without brackets.
pub fn extract_domain(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = match parsed.host()? {
        Host::Domain(domain) => domain.to_lowercase(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    };
    let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Accepts RFC 3339, or "YYYY-MM-DD HH:MM:SS" / "YYYY-MM-DDTHH:MM:SS" taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    anyhow::bail!("Unrecognized timestamp format")
}
