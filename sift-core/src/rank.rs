use crate::config::RankingConfig;
use crate::domains::matches_any;
use crate::model::{Candidate, RankedResult};
use sift_scanner::error::{Result as ScanResult, ScanError};
use sift_scanner::{CrawlSession, CrawlTree, Fetch, KeywordScorer, Page};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Callback for reporting ranking progress
pub type RankProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A candidate whose tree has been built and scored.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub tree: CrawlTree,
    /// Tree total, authority bonus included
    pub total: f64,
    pub authority: bool,
}

impl ScoredCandidate {
    /// Candidates with no user-term hit at the root must reach the floor.
    pub fn passes_floor(&self, floor: f64) -> bool {
        self.tree.root.page.user_count() > 0 || self.total >= floor
    }

    pub fn to_result(&self, user_keyword: &str) -> RankedResult {
        let root = &self.tree.root.page;
        let title = if self.candidate.title.trim().is_empty() {
            user_keyword.to_string()
        } else {
            self.candidate.title.clone()
        };
        RankedResult {
            url: self.candidate.url.clone(),
            title,
            ai_keyword_count: root.ai_count(),
            user_keyword_count: root.user_count(),
            score: self.total.trunc() as i64,
        }
    }
}

/// Ranks search candidates by crawling a bounded link tree under each one.
pub struct Ranker {
    fetcher: Arc<dyn Fetch>,
    scorer: Arc<KeywordScorer>,
    config: Arc<RankingConfig>,
    progress_callback: Option<RankProgressCallback>,
}

impl Ranker {
    pub fn new(fetcher: Arc<dyn Fetch>, config: RankingConfig) -> Self {
        Self {
            fetcher,
            scorer: Arc::new(KeywordScorer::new(config.scoring.clone())),
            config: Arc::new(config),
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: RankProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Rank `candidates` for `user_keyword`, best first.
    pub async fn rank(&self, candidates: Vec<Candidate>, user_keyword: &str) -> Vec<RankedResult> {
        self.rank_scored(candidates, user_keyword)
            .await
            .iter()
            .map(|scored| scored.to_result(user_keyword))
            .collect()
    }

    /// Like [`Ranker::rank`], but keeps each survivor's scored tree.
    ///
    /// Denied candidates are dropped before any fetch. The rest are crawled
    /// concurrently, at most `concurrency` at a time; a candidate that fails
    /// is logged and left out. Survivors are sorted by total, descending,
    /// with ties kept in input order.
    pub async fn rank_scored(
        &self,
        candidates: Vec<Candidate>,
        user_keyword: &str,
    ) -> Vec<ScoredCandidate> {
        info!(
            "Ranking {} candidates for '{}' with {} workers",
            candidates.len(),
            user_keyword,
            self.config.concurrency
        );

        let deadline = self.config.deadline().map(|d| Instant::now() + d);
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let mut handles = Vec::new();
        for candidate in candidates {
            if matches_any(&candidate.url, &self.config.deny_domains) {
                debug!("Dropping denied candidate {}", candidate.url);
                continue;
            }

            let url = candidate.url.clone();
            let fetcher = self.fetcher.clone();
            let scorer = self.scorer.clone();
            let config = self.config.clone();
            let semaphore = semaphore.clone();
            let keyword = user_keyword.to_string();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| ScanError::Other(format!("Worker pool closed: {}", e)))?;
                crawl_candidate(candidate, &keyword, fetcher, scorer, &config, deadline).await
            });
            handles.push((url, handle));
        }

        let total = handles.len();
        let mut scored = Vec::with_capacity(total);
        for (idx, (url, handle)) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(candidate)) => scored.push(candidate),
                Ok(Err(e)) => warn!("Skipping candidate {}: {}", url, e),
                Err(e) => warn!("Skipping candidate {}: {}", url, ScanError::from(e)),
            }
            if let Some(ref callback) = self.progress_callback {
                callback(format!("Ranked {}/{}: {}", idx + 1, total, url));
            }
        }

        let floor = self.config.score_floor;
        let mut kept: Vec<ScoredCandidate> = scored
            .into_iter()
            .filter(|s| {
                let keep = s.passes_floor(floor);
                if !keep {
                    debug!(
                        "Dropping {} with total {:.1} below floor {:.1}",
                        s.candidate.url, s.total, floor
                    );
                }
                keep
            })
            .collect();

        // sort_by is stable, so equal totals keep their input order
        kept.sort_by(|a, b| b.total.total_cmp(&a.total));

        info!("Ranking complete: {} of {} candidates kept", kept.len(), total);
        kept
    }
}

/// Fetch, crawl and score one candidate in its own session.
///
/// The root's links are only followed when its readable content is longer
/// than `min_content_length`.
pub async fn crawl_candidate(
    candidate: Candidate,
    user_keyword: &str,
    fetcher: Arc<dyn Fetch>,
    scorer: Arc<KeywordScorer>,
    config: &RankingConfig,
    deadline: Option<Instant>,
) -> ScanResult<ScoredCandidate> {
    let parsed = Url::parse(&candidate.url)
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", candidate.url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScanError::InvalidUrl(format!(
            "{}: unsupported scheme {}",
            candidate.url,
            parsed.scheme()
        )));
    }

    let session = CrawlSession::new(fetcher, scorer, user_keyword)
        .with_limits(config.crawl_limits())
        .with_deadline(deadline);

    let body = session.fetch(&candidate.url).await.unwrap_or_default();
    let root = Page::candidate(
        &candidate.url,
        &candidate.title,
        &candidate.snippet,
        body,
        session.scorer(),
        user_keyword,
    );

    let mut tree = if root.content_length() > config.min_content_length {
        CrawlTree::build(root, &session).await
    } else {
        CrawlTree::build_to_depth(root, 1, &session).await
    };
    let mut total = tree.compute_total_score();

    let authority = matches_any(&candidate.url, &config.authority_domains);
    if authority {
        total = tree.apply_authority_bonus(config.authority_bonus);
    }

    debug!(
        "Scored {}: {} nodes, total {:.1}",
        candidate.url,
        tree.root.len(),
        total
    );

    Ok(ScoredCandidate {
        candidate,
        tree,
        total,
        authority,
    })
}
