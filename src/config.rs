use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::warn;

/// Tunables for pairwise coordination detection.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinationConfig {
    /// Two posts are compared only if they are at most this far apart
    pub time_window_minutes: u32,
    /// Minimum pair score (inclusive) for two authors to count as coordinated
    pub similarity_threshold: f64,
    /// Connected components smaller than this are dropped
    pub min_group_size: usize,
    pub text_weight: f64,
    pub domain_weight: f64,
    pub hashtag_weight: f64,
}

impl CoordinationConfig {
    pub fn time_window_secs(&self) -> f64 {
        f64::from(self.time_window_minutes) * 60.0
    }
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            time_window_minutes: 60,
            similarity_threshold: 0.85,
            min_group_size: 3,
            text_weight: 0.5,
            domain_weight: 0.3,
            hashtag_weight: 0.2,
        }
    }
}

/// Per-component weights for the combined risk score.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskWeights {
    pub velocity: f64,
    pub coordination_density: f64,
    pub bot_score: f64,
    pub foreign_domain_ratio: f64,
    pub toxicity: f64,
}

impl RiskWeights {
    pub fn sum(&self) -> f64 {
        self.velocity
            + self.coordination_density
            + self.bot_score
            + self.foreign_domain_ratio
            + self.toxicity
    }
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            velocity: 0.25,
            coordination_density: 0.30,
            bot_score: 0.20,
            foreign_domain_ratio: 0.15,
            toxicity: 0.10,
        }
    }
}

/// Risk level cut-offs. Expected to ascend: low < medium < high.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: 0.3,
            medium: 0.6,
            high: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub weights: RiskWeights,
    pub thresholds: RiskThresholds,
    /// Domain suffixes treated as foreign-origin (e.g. ".ru")
    pub foreign_tlds: Vec<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            thresholds: RiskThresholds::default(),
            foreign_tlds: vec![".ru".to_string(), ".cn".to_string(), ".ir".to_string()],
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// Every value has a default, so an empty environment gives the stock
/// scoring model. The .env file is loaded at startup via dotenvy.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: String,
    pub coordination: CoordinationConfig,
    pub risk: RiskConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./narrative_graph.db".to_string(),
            coordination: CoordinationConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; set-but-unparseable ones are errors.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `load()` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Config::default();

        let coordination = CoordinationConfig {
            time_window_minutes: parse_or(
                &lookup,
                "COORDINATION_TIME_WINDOW_MINUTES",
                d.coordination.time_window_minutes,
            )?,
            similarity_threshold: parse_or(
                &lookup,
                "COORDINATION_SIMILARITY_THRESHOLD",
                d.coordination.similarity_threshold,
            )?,
            min_group_size: parse_or(
                &lookup,
                "COORDINATION_MIN_GROUP_SIZE",
                d.coordination.min_group_size,
            )?,
            text_weight: parse_or(&lookup, "COORDINATION_TEXT_WEIGHT", d.coordination.text_weight)?,
            domain_weight: parse_or(
                &lookup,
                "COORDINATION_DOMAIN_WEIGHT",
                d.coordination.domain_weight,
            )?,
            hashtag_weight: parse_or(
                &lookup,
                "COORDINATION_HASHTAG_WEIGHT",
                d.coordination.hashtag_weight,
            )?,
        };

        let weights = RiskWeights {
            velocity: parse_or(&lookup, "RISK_WEIGHT_VELOCITY", d.risk.weights.velocity)?,
            coordination_density: parse_or(
                &lookup,
                "RISK_WEIGHT_COORDINATION",
                d.risk.weights.coordination_density,
            )?,
            bot_score: parse_or(&lookup, "RISK_WEIGHT_BOT", d.risk.weights.bot_score)?,
            foreign_domain_ratio: parse_or(
                &lookup,
                "RISK_WEIGHT_FOREIGN_DOMAIN",
                d.risk.weights.foreign_domain_ratio,
            )?,
            toxicity: parse_or(&lookup, "RISK_WEIGHT_TOXICITY", d.risk.weights.toxicity)?,
        };

        let thresholds = RiskThresholds {
            low: parse_or(&lookup, "RISK_THRESHOLD_LOW", d.risk.thresholds.low)?,
            medium: parse_or(&lookup, "RISK_THRESHOLD_MEDIUM", d.risk.thresholds.medium)?,
            high: parse_or(&lookup, "RISK_THRESHOLD_HIGH", d.risk.thresholds.high)?,
        };

        let foreign_tlds = match lookup("RISK_FOREIGN_TLDS") {
            Some(raw) => parse_tlds(&raw),
            None => d.risk.foreign_tlds,
        };

        Ok(Self {
            db_path: lookup("NARRATIVE_DB_PATH").unwrap_or(d.db_path),
            coordination,
            risk: RiskConfig {
                weights,
                thresholds,
                foreign_tlds,
            },
        })
    }

    /// Reject configurations that would silently distort scoring.
    ///
    /// Thresholds must ascend and no weight may be negative. Risk weights
    /// that don't sum to 1.0 are allowed but logged.
    pub fn validate(&self) -> Result<()> {
        let t = &self.risk.thresholds;
        if !(t.low < t.medium && t.medium < t.high) {
            anyhow::bail!(
                "Risk thresholds must ascend (low < medium < high), got {} / {} / {}",
                t.low,
                t.medium,
                t.high
            );
        }

        let c = &self.coordination;
        let w = &self.risk.weights;
        let all_weights = [
            ("COORDINATION_TEXT_WEIGHT", c.text_weight),
            ("COORDINATION_DOMAIN_WEIGHT", c.domain_weight),
            ("COORDINATION_HASHTAG_WEIGHT", c.hashtag_weight),
            ("RISK_WEIGHT_VELOCITY", w.velocity),
            ("RISK_WEIGHT_COORDINATION", w.coordination_density),
            ("RISK_WEIGHT_BOT", w.bot_score),
            ("RISK_WEIGHT_FOREIGN_DOMAIN", w.foreign_domain_ratio),
            ("RISK_WEIGHT_TOXICITY", w.toxicity),
        ];
        for (name, value) in all_weights {
            if value < 0.0 || value.is_nan() {
                anyhow::bail!("{name} must be a non-negative number, got {value}");
            }
        }

        if !(0.0..=1.0).contains(&c.similarity_threshold) {
            anyhow::bail!(
                "COORDINATION_SIMILARITY_THRESHOLD must be within 0.0-1.0, got {}",
                c.similarity_threshold
            );
        }

        let sum = w.sum();
        if (sum - 1.0).abs() > 1e-6 {
            warn!(sum, "Risk weights do not sum to 1.0; risk scores may exceed 1.0");
        }

        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

/// Split a comma-separated TLD list, adding the leading dot where missing.
fn parse_tlds(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let s = s.to_lowercase();
            if s.starts_with('.') {
                s
            } else {
                format!(".{s}")
            }
        })
        .collect()
}
