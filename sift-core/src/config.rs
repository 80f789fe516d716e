use crate::domains::{DEFAULT_AUTHORITY_DOMAINS, DEFAULT_DENY_DOMAINS, to_owned_list};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use sift_scanner::crawler::{DEFAULT_DECAY, DEFAULT_MAX_CHILDREN, DEFAULT_MAX_DEPTH};
use sift_scanner::{CrawlLimits, FetchConfig, ScoringConfig};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Minimum readable characters a root page needs before its links are followed.
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 200;
pub const DEFAULT_AUTHORITY_BONUS: f64 = 200.0;
/// Results with no user-term hits and a tree total below this are dropped.
pub const DEFAULT_SCORE_FLOOR: f64 = 10.0;
pub const DEFAULT_CONCURRENCY: usize = 15;

/// Every knob the ranking pipeline reads. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_max_children")]
    pub max_children_per_node: usize,

    #[serde(default = "default_decay")]
    pub decay: f64,

    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,

    #[serde(default = "default_authority_bonus")]
    pub authority_bonus: f64,

    #[serde(default = "default_score_floor")]
    pub score_floor: f64,

    /// Candidates crawled at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Whole-request deadline; unset means no deadline
    #[serde(default)]
    pub deadline_secs: Option<u64>,

    #[serde(default = "default_deny_domains")]
    pub deny_domains: Vec<String>,

    #[serde(default = "default_authority_domains")]
    pub authority_domains: Vec<String>,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_children() -> usize {
    DEFAULT_MAX_CHILDREN
}

fn default_decay() -> f64 {
    DEFAULT_DECAY
}

fn default_min_content_length() -> usize {
    DEFAULT_MIN_CONTENT_LENGTH
}

fn default_authority_bonus() -> f64 {
    DEFAULT_AUTHORITY_BONUS
}

fn default_score_floor() -> f64 {
    DEFAULT_SCORE_FLOOR
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_deny_domains() -> Vec<String> {
    to_owned_list(DEFAULT_DENY_DOMAINS)
}

fn default_authority_domains() -> Vec<String> {
    to_owned_list(DEFAULT_AUTHORITY_DOMAINS)
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_children_per_node: default_max_children(),
            decay: default_decay(),
            min_content_length: default_min_content_length(),
            authority_bonus: default_authority_bonus(),
            score_floor: default_score_floor(),
            concurrency: default_concurrency(),
            deadline_secs: None,
            deny_domains: default_deny_domains(),
            authority_domains: default_authority_domains(),
            scoring: ScoringConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl RankingConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(CoreError::Config("max_depth must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(CoreError::Config("concurrency must be at least 1".into()));
        }
        if !self.decay.is_finite() || self.decay < 0.0 {
            return Err(CoreError::Config(format!(
                "decay must be a non-negative number, got {}",
                self.decay
            )));
        }
        if !self.score_floor.is_finite() || !self.authority_bonus.is_finite() {
            return Err(CoreError::Config(
                "score_floor and authority_bonus must be finite".into(),
            ));
        }
        Ok(())
    }

    pub fn crawl_limits(&self) -> CrawlLimits {
        CrawlLimits {
            max_depth: self.max_depth,
            max_children: self.max_children_per_node,
            decay: self.decay,
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RankingConfig::default();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.max_children_per_node, 3);
        assert_eq!(config.decay, 0.6);
        assert_eq!(config.min_content_length, 200);
        assert_eq!(config.authority_bonus, 200.0);
        assert_eq!(config.score_floor, 10.0);
        assert_eq!(config.concurrency, 15);
        assert!(config.deadline().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RankingConfig::from_json(r#"{"score_floor": 1.0, "deadline_secs": 20}"#).unwrap();
        assert_eq!(config.score_floor, 1.0);
        assert_eq!(config.deadline(), Some(Duration::from_secs(20)));
        assert_eq!(config.max_depth, 2);
        assert!(config.deny_domains.iter().any(|d| d == "facebook.com"));
        assert_eq!(config.scoring, ScoringConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(RankingConfig::from_json(r#"{"max_depth": 0}"#).is_err());
        assert!(RankingConfig::from_json(r#"{"concurrency": 0}"#).is_err());
        assert!(RankingConfig::from_json(r#"{"decay": -0.5}"#).is_err());
        assert!(matches!(
            RankingConfig::from_json("not json"),
            Err(CoreError::Json(_))
        ));
    }
}
