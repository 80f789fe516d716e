// Tests for loading ranking configuration from disk

use sift_core::config::RankingConfig;
use sift_core::error::CoreError;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_from_file_reads_overrides() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{
            "max_depth": 3,
            "concurrency": 4,
            "deny_domains": ["spam.test"],
            "scoring": {{ "user_weight": 10.0 }},
            "fetch": {{ "timeout_secs": 2 }}
        }}"#
    )
    .unwrap();

    let config = RankingConfig::from_file(file.path()).unwrap();

    assert_eq!(config.max_depth, 3);
    assert_eq!(config.concurrency, 4);
    assert_eq!(config.deny_domains, vec!["spam.test".to_string()]);
    assert_eq!(config.scoring.user_weight, 10.0);
    assert_eq!(config.fetch.timeout_secs, 2);
    // Untouched fields keep their defaults
    assert_eq!(config.max_children_per_node, 3);
    assert!(config.authority_domains.iter().any(|d| d == "reuters.com"));
}

#[test]
fn test_from_file_missing_is_io_error() {
    let result = RankingConfig::from_file("/nonexistent/sift/config.json");
    assert!(matches!(result, Err(CoreError::Io(_))));
}

#[test]
fn test_from_file_invalid_values_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"max_depth": 0}}"#).unwrap();

    let result = RankingConfig::from_file(file.path());
    assert!(matches!(result, Err(CoreError::Config(_))));
}

#[test]
fn test_crawl_limits_follow_config() {
    let config = RankingConfig {
        max_depth: 4,
        max_children_per_node: 7,
        decay: 0.5,
        ..Default::default()
    };
    let limits = config.crawl_limits();
    assert_eq!(limits.max_depth, 4);
    assert_eq!(limits.max_children, 7);
    assert_eq!(limits.decay, 0.5);
}
