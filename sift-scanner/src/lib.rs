pub mod crawler;
pub mod dump;
pub mod error;
pub mod fetch;
pub mod links;
pub mod page;
pub mod score;

pub use crawler::{CrawlLimits, CrawlNode, CrawlSession, CrawlTree, VisitedSet};
pub use error::ScanError;
pub use fetch::{Fetch, FetchConfig, HttpFetcher};
pub use page::Page;
pub use score::{KeywordScorer, ScoringConfig};
