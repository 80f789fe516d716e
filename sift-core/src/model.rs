use serde::{Deserialize, Serialize};

/// One search hit to be crawled and ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(alias = "link")]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

impl Candidate {
    pub fn new(url: &str, title: &str, snippet: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            snippet: snippet.to_string(),
        }
    }
}

/// Externally visible projection of a ranked candidate.
///
/// The keyword counts describe the root page only; `score` is the truncated
/// tree total, authority bonus included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub url: String,
    pub title: String,
    pub ai_keyword_count: u32,
    pub user_keyword_count: u32,
    pub score: i64,
}
