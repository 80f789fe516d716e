use crate::fetch::Fetch;
use crate::links::{discover_links, has_denied_extension};
use crate::page::Page;
use crate::score::KeywordScorer;
use futures::future::{BoxFuture, join_all};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const DEFAULT_MAX_CHILDREN: usize = 3;
pub const DEFAULT_DECAY: f64 = 0.6;

/// Shape limits for one crawl tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrawlLimits {
    /// Deepest level a node may sit at; the root is depth 1.
    pub max_depth: usize,
    pub max_children: usize,
    /// Multiplier applied to a child's aggregate score in its parent.
    pub decay: f64,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_children: DEFAULT_MAX_CHILDREN,
            decay: DEFAULT_DECAY,
        }
    }
}

/// URLs already claimed by a session, keyed by exact string.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-insert as one step. Returns true if the URL was new.
    pub fn claim(&self, url: &str) -> bool {
        // A poisoned lock still holds a consistent set; keep using it
        let mut urls = self.urls.lock().unwrap_or_else(|e| e.into_inner());
        urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        let urls = self.urls.lock().unwrap_or_else(|e| e.into_inner());
        urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-candidate crawl context: the visited set, the scoring setup, and the
/// fetch collaborator.
pub struct CrawlSession {
    fetcher: Arc<dyn Fetch>,
    scorer: Arc<KeywordScorer>,
    user_term: String,
    limits: CrawlLimits,
    visited: VisitedSet,
    deadline: Option<Instant>,
    expired: AtomicBool,
}

impl CrawlSession {
    pub fn new(fetcher: Arc<dyn Fetch>, scorer: Arc<KeywordScorer>, user_term: &str) -> Self {
        Self {
            fetcher,
            scorer,
            user_term: user_term.to_string(),
            limits: CrawlLimits::default(),
            visited: VisitedSet::new(),
            deadline: None,
            expired: AtomicBool::new(false),
        }
    }

    pub fn with_limits(mut self, limits: CrawlLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Abandon any fetch still running at `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn scorer(&self) -> &KeywordScorer {
        &self.scorer
    }

    pub fn user_term(&self) -> &str {
        &self.user_term
    }

    pub fn limits(&self) -> CrawlLimits {
        self.limits
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Relaxed)
    }

    /// Fetch through the collaborator, bounded by the session deadline.
    /// `None` means the deadline cut the fetch off.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        if self.is_expired() {
            return None;
        }
        let Some(deadline) = self.deadline else {
            return Some(self.fetcher.fetch(url).await);
        };
        match tokio::time::timeout_at(deadline, self.fetcher.fetch(url)).await {
            Ok(body) => Some(body),
            Err(_) => {
                debug!("Deadline reached, abandoning fetch of {}", url);
                self.expired.store(true, Ordering::Relaxed);
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlNode {
    pub page: Page,
    pub children: Vec<CrawlNode>,
    pub depth: usize,
    aggregate_score: Option<f64>,
}

impl CrawlNode {
    pub fn new(page: Page, depth: usize) -> Self {
        Self {
            page,
            children: Vec::new(),
            depth,
            aggregate_score: None,
        }
    }

    /// Set by [`CrawlTree::compute_total_score`]; `None` until then.
    pub fn aggregate_score(&self) -> Option<f64> {
        self.aggregate_score
    }

    fn compute(&mut self, decay: f64) -> f64 {
        let children: f64 = self
            .children
            .iter_mut()
            .map(|child| decay * child.compute(decay))
            .sum();
        let total = self.page.score() + children;
        self.aggregate_score = Some(total);
        total
    }

    /// Depth of the deepest node in this subtree.
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(CrawlNode::height)
            .max()
            .unwrap_or(self.depth)
    }

    /// Number of nodes in this subtree, including this one.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(CrawlNode::len).sum::<usize>()
    }
}

#[derive(Debug, Clone)]
pub struct CrawlTree {
    pub root: CrawlNode,
    pub max_depth: usize,
    decay: f64,
    authority_bonus: Option<f64>,
}

impl CrawlTree {
    /// Wrap an already assembled root. Nothing is fetched.
    pub fn from_root(root: CrawlNode, max_depth: usize, decay: f64) -> Self {
        Self {
            root,
            max_depth,
            decay,
            authority_bonus: None,
        }
    }

    /// Grow a tree from `root` depth-first, down to the session's depth limit.
    ///
    /// Only links that pass the extension filter and are new to the
    /// session's visited set are fetched. The root is depth 1.
    pub async fn build(root: Page, session: &CrawlSession) -> Self {
        Self::build_to_depth(root, session.limits.max_depth, session).await
    }

    /// Like [`CrawlTree::build`], with an explicit depth limit in place of
    /// the session's.
    pub async fn build_to_depth(root: Page, max_depth: usize, session: &CrawlSession) -> Self {
        let max_depth = max_depth.max(1);
        session.visited.claim(root.url());

        let mut root = CrawlNode::new(root, 1);
        expand(&mut root, max_depth, session).await;
        debug!(
            "Built tree for {} with {} nodes",
            root.page.url(),
            root.len()
        );

        Self {
            root,
            max_depth,
            decay: session.limits.decay,
            authority_bonus: None,
        }
    }

    /// Post-order aggregation: each node's page score plus `decay` times the
    /// aggregate of each child. Call once the tree is fully built.
    pub fn compute_total_score(&mut self) -> f64 {
        let total = self.root.compute(self.decay);
        match self.authority_bonus {
            Some(bonus) => {
                let boosted = total + bonus;
                self.root.aggregate_score = Some(boosted);
                boosted
            }
            None => total,
        }
    }

    /// Add `bonus` to the root aggregate. Applying it twice is a no-op.
    pub fn apply_authority_bonus(&mut self, bonus: f64) -> f64 {
        if self.authority_bonus.is_none() {
            self.authority_bonus = Some(bonus);
            if let Some(total) = self.root.aggregate_score {
                self.root.aggregate_score = Some(total + bonus);
            }
        }
        self.total_score()
    }

    /// Root aggregate, or `None` before scoring.
    pub fn total(&self) -> Option<f64> {
        self.root.aggregate_score
    }

    fn total_score(&self) -> f64 {
        self.root.aggregate_score.unwrap_or_default()
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }
}

fn expand<'a>(
    node: &'a mut CrawlNode,
    max_depth: usize,
    session: &'a CrawlSession,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        if node.depth >= max_depth || session.is_expired() || node.page.raw_text().is_empty() {
            return;
        }

        let accepted = accept_links(node.page.raw_text(), session);
        if accepted.is_empty() {
            return;
        }

        let fetches = accepted.iter().map(|url| session.fetch(url));
        let bodies = join_all(fetches).await;

        for (url, body) in accepted.iter().zip(bodies) {
            // Abandoned by the deadline: the page never completed
            let Some(body) = body else {
                continue;
            };
            let page = Page::fetched(url, body, session.scorer(), session.user_term());
            node.children.push(CrawlNode::new(page, node.depth + 1));
        }

        for child in node.children.iter_mut() {
            expand(child, max_depth, session).await;
        }
    })
}

/// Pick at most `max_children` new, fetchable links, claiming each in the
/// visited set before anything is fetched.
fn accept_links(raw_text: &str, session: &CrawlSession) -> Vec<String> {
    let mut accepted = Vec::new();
    for link in discover_links(raw_text) {
        if accepted.len() >= session.limits.max_children {
            break;
        }
        if has_denied_extension(&link) {
            continue;
        }
        if session.visited.claim(&link) {
            accepted.push(link);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    /// In-memory site that records every requested URL.
    #[derive(Default)]
    struct MapFetcher {
        pages: HashMap<String, String>,
        requests: StdMutex<Vec<String>>,
    }

    impl MapFetcher {
        fn with_page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for MapFetcher {
        async fn fetch(&self, url: &str) -> String {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().unwrap_or_default()
        }
    }

    fn link(url: &str) -> String {
        format!(r#"<a href="{}">link</a>"#, url)
    }

    fn session(fetcher: Arc<MapFetcher>, limits: CrawlLimits) -> CrawlSession {
        CrawlSession::new(fetcher, Arc::new(KeywordScorer::default()), "robot").with_limits(limits)
    }

    fn root_page(body: &str, scorer: &KeywordScorer) -> Page {
        Page::fetched("https://root.test/", body.to_string(), scorer, "robot")
    }

    fn assert_aggregate(node: &CrawlNode, decay: f64) {
        let expected = node.page.score()
            + node
                .children
                .iter()
                .map(|c| decay * c.aggregate_score().unwrap())
                .sum::<f64>();
        assert!((node.aggregate_score().unwrap() - expected).abs() < 1e-6);
        for child in &node.children {
            assert_aggregate(child, decay);
        }
    }

    #[tokio::test]
    async fn test_children_are_capped_and_scored() {
        let mut root_body = String::new();
        for i in 0..150 {
            root_body.push_str(&link(&format!("https://site.test/{}", i)));
        }
        let fetcher = Arc::new(
            MapFetcher::default()
                .with_page("https://site.test/0", "robot")
                .with_page("https://site.test/1", "robot robot"),
        );
        let session = session(fetcher.clone(), CrawlLimits::default());
        let root = root_page(&root_body, session.scorer());

        let mut tree = CrawlTree::build_to_depth(root, 2, &session).await;
        assert_eq!(tree.root.children.len(), 3);
        assert_eq!(tree.root.height(), 2);
        assert_eq!(fetcher.requests().len(), 3);

        let total = tree.compute_total_score();
        assert!((total - (0.0 + 0.6 * 30.0 + 0.6 * 60.0 + 0.0)).abs() < 1e-6);
        assert_aggregate(&tree.root, 0.6);
    }

    #[tokio::test]
    async fn test_no_url_is_fetched_twice() {
        // a <-> b backlinks and both link back to the root
        let root = "https://root.test/";
        let a = "https://a.test/";
        let b = "https://b.test/";
        let fetcher = Arc::new(
            MapFetcher::default()
                .with_page(a, &format!("{}{}{}", link(b), link(root), link(a)))
                .with_page(b, &format!("{}{}", link(a), link(root))),
        );
        let limits = CrawlLimits {
            max_depth: 5,
            ..Default::default()
        };
        let session = session(fetcher.clone(), limits);
        let page = root_page(&format!("{}{}", link(a), link(b)), session.scorer());

        let tree = CrawlTree::build(page, &session).await;

        let requests = fetcher.requests();
        let unique: HashSet<&String> = requests.iter().collect();
        assert_eq!(requests.len(), unique.len());
        assert!(!requests.contains(&root.to_string()));
        assert_eq!(tree.root.len(), 3);
        assert!(session.visited().contains(a));
    }

    #[tokio::test]
    async fn test_depth_never_exceeds_limit() {
        // Every page links to 120 fresh pages
        struct Endless;

        #[async_trait]
        impl Fetch for Endless {
            async fn fetch(&self, url: &str) -> String {
                (0..120)
                    .map(|i| link(&format!("{}/{}", url.trim_end_matches('/'), i)))
                    .collect()
            }
        }

        for max_depth in 1..=4 {
            let limits = CrawlLimits {
                max_depth,
                ..Default::default()
            };
            let session = CrawlSession::new(
                Arc::new(Endless),
                Arc::new(KeywordScorer::default()),
                "robot",
            )
            .with_limits(limits);
            let body = Endless.fetch("https://root.test").await;
            let page = root_page(&body, session.scorer());
            let tree = CrawlTree::build(page, &session).await;
            assert_eq!(tree.max_depth, max_depth);
            assert_eq!(tree.root.height(), max_depth);
            for child in &tree.root.children {
                assert!(child.children.len() <= DEFAULT_MAX_CHILDREN);
            }
        }
    }

    #[tokio::test]
    async fn test_denied_extensions_are_never_fetched() {
        let fetcher = Arc::new(MapFetcher::default());
        let session = session(fetcher.clone(), CrawlLimits::default());
        let body = format!(
            "{}{}{}",
            link("https://a.test/app.js"),
            link("https://a.test/logo.png"),
            link("https://a.test/story")
        );
        let tree = CrawlTree::build_to_depth(root_page(&body, session.scorer()), 2, &session).await;

        assert_eq!(fetcher.requests(), vec!["https://a.test/story".to_string()]);
        assert_eq!(tree.root.children.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_root_is_a_leaf() {
        let fetcher = Arc::new(MapFetcher::default());
        let session = session(fetcher.clone(), CrawlLimits::default());
        let mut tree = CrawlTree::build_to_depth(root_page("", session.scorer()), 3, &session).await;

        assert!(tree.root.children.is_empty());
        assert!(fetcher.requests().is_empty());
        assert_eq!(tree.total(), None);
        assert_eq!(tree.compute_total_score(), 0.0);
    }

    #[tokio::test]
    async fn test_authority_bonus_is_applied_once() {
        let fetcher = Arc::new(MapFetcher::default().with_page("https://a.test/", "robot"));
        let session = session(fetcher, CrawlLimits::default());
        let page = root_page(&format!("robot {}", link("https://a.test/")), session.scorer());
        let mut tree = CrawlTree::build_to_depth(page, 2, &session).await;

        let base = tree.compute_total_score();
        assert!((base - 48.0).abs() < 1e-6);
        assert!((tree.apply_authority_bonus(200.0) - 248.0).abs() < 1e-6);
        assert!((tree.apply_authority_bonus(200.0) - 248.0).abs() < 1e-6);
        // Recomputing keeps the bonus without decaying it
        assert!((tree.compute_total_score() - 248.0).abs() < 1e-6);
        assert_eq!(tree.root.page.score(), 30.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_abandons_fetches() {
        struct Slow;

        #[async_trait]
        impl Fetch for Slow {
            async fn fetch(&self, _url: &str) -> String {
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                "robot".to_string()
            }
        }

        let deadline = Instant::now() + std::time::Duration::from_secs(1);
        let session = CrawlSession::new(
            Arc::new(Slow),
            Arc::new(KeywordScorer::default()),
            "robot",
        )
        .with_deadline(Some(deadline));
        let page = root_page(&link("https://a.test/"), session.scorer());
        let mut tree = CrawlTree::build_to_depth(page, 3, &session).await;

        assert!(session.is_expired());
        assert!(tree.root.children.is_empty());
        assert_eq!(tree.compute_total_score(), 0.0);
    }
}
