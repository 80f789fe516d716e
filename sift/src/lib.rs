// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    RankOverrides, load_candidates_from_file, load_ranking_config, parse_url_line,
};

// Re-export ranking functionality from sift-core
pub use sift_core::rank::{RankProgressCallback, Ranker, ScoredCandidate};
