pub mod config;
pub mod domains;
pub mod error;
pub mod model;
pub mod rank;
pub mod report;

pub use config::RankingConfig;
pub use error::CoreError;
pub use model::{Candidate, RankedResult};
pub use rank::{RankProgressCallback, Ranker, ScoredCandidate};
