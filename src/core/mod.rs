// Core engine exports
pub mod capacity;
pub mod coverage;
pub mod error;
pub mod explain;
pub mod matcher;
pub mod needs;
pub mod scoring;
pub mod taxonomy;

pub use capacity::{capacity_pct, is_eligible, CapacityDecision};
pub use coverage::CoverageIndex;
pub use error::{DataWarning, MatchError};
pub use matcher::{Matcher, PairEvaluation, RunSpec};
pub use needs::{Need, NeedProfile};
pub use scoring::{calculate_pair_score, Contribution, HorizonFactors, PairScore, ScoringParams};
pub use taxonomy::Taxonomy;
